fn main() {
    metallisense_lib::run()
}
