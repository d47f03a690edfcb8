// crates/ppi-cli/src/shared.rs
//
// SharedProtocol: one protocol instance behind an async mutex.
//
// Every call takes the lock for its whole duration, so calls from concurrent
// tasks are serialized exactly as a single-writer host would run them.

use std::sync::Arc;

use tokio::sync::Mutex;

use ppi_core::ManualClock;
use ppi_farm::{Protocol, ProtocolState};

#[derive(Clone)]
pub struct SharedProtocol {
    protocol: Arc<Mutex<Protocol<ManualClock>>>,
    clock: ManualClock,
}

impl SharedProtocol {
    pub fn new(protocol: Protocol<ManualClock>) -> Self {
        let clock = protocol.clock().clone();
        Self {
            protocol: Arc::new(Mutex::new(protocol)),
            clock,
        }
    }

    /// The clock shared with the protocol.
    pub fn clock(&self) -> &ManualClock {
        &self.clock
    }

    /// Run one call with exclusive access.
    pub async fn call<R>(&self, f: impl FnOnce(&mut Protocol<ManualClock>) -> R) -> R {
        let mut protocol = self.protocol.lock().await;
        f(&mut protocol)
    }

    pub async fn state(&self) -> ProtocolState {
        self.protocol.lock().await.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProtocolConfig;
    use ppi_core::{Address, Clock};

    fn shared() -> SharedProtocol {
        let config = ProtocolConfig::default();
        let protocol = config
            .build_protocol(ManualClock::new(config.start_time))
            .unwrap();
        SharedProtocol::new(protocol)
    }

    #[tokio::test]
    async fn test_concurrent_calls_are_serialized() {
        let shared = shared();
        let token = Address::from_label("ETH/USDT");
        let mut handles = Vec::new();
        for i in 0..16u64 {
            let shared = shared.clone();
            handles.push(tokio::spawn(async move {
                let account = Address::from_label(&format!("user-{}", i % 4));
                shared
                    .call(|p| p.mint(&token, &account, 1_000))
                    .await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        let state = shared.state().await;
        assert_eq!(state.tokens.total_supply(&token), 16_000);
        assert_eq!(
            state.tokens.balance_of(&token, &Address::from_label("user-0")),
            4_000
        );
    }

    #[tokio::test]
    async fn test_clock_is_shared_with_protocol() {
        let shared = shared();
        let start = shared.clock().now();
        shared.clock().advance(3_600);
        let now = shared.call(|p| p.now()).await;
        assert_eq!(now, start + 3_600);
    }
}
