//! Shared types for the bridge layer.

use std::sync::Arc;

use crate::core_state::CoreState;
use crate::gateway::GatewayApi;

/// Shared context for all bridge routes.
pub struct BridgeContext<A: GatewayApi> {
    pub core: Arc<CoreState<A>>,
}

impl<A: GatewayApi> BridgeContext<A> {
    pub fn new(core: Arc<CoreState<A>>) -> Self {
        Self { core }
    }
}

// Manual impl: `A` itself need not be `Clone`.
impl<A: GatewayApi> Clone for BridgeContext<A> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}
