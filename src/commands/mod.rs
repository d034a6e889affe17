pub mod opc;
