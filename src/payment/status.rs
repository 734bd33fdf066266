use rand::Rng;

/// What the (simulated) gateway reports for a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GatewayStatus {
    Success,
    Pending,
}

/// Source of settlement status for payment requests.
pub(crate) trait StatusSource {
    fn poll(&mut self, transaction_id: &str) -> GatewayStatus;
}

/// Stand-in for a real gateway: succeeds when a uniform draw exceeds `threshold`.
#[derive(Debug, Clone)]
pub(crate) struct RandomStatusSource {
    threshold: f64,
}

impl RandomStatusSource {
    pub(crate) const DEFAULT_THRESHOLD: f64 = 0.3;

    #[cfg(test)]
    pub(crate) fn with_threshold(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl Default for RandomStatusSource {
    fn default() -> Self {
        Self {
            threshold: Self::DEFAULT_THRESHOLD,
        }
    }
}

impl StatusSource for RandomStatusSource {
    fn poll(&mut self, transaction_id: &str) -> GatewayStatus {
        let draw: f64 = rand::thread_rng().gen();
        log::debug!("Simulated gateway draw {draw:.3} for {transaction_id}");
        if draw > self.threshold {
            GatewayStatus::Success
        } else {
            GatewayStatus::Pending
        }
    }
}

/// Replays a fixed script of statuses, then keeps repeating the last one.
#[cfg(test)]
pub(crate) struct ScriptedStatusSource {
    script: std::collections::VecDeque<GatewayStatus>,
    last: GatewayStatus,
    pub(crate) polls: usize,
}

#[cfg(test)]
impl ScriptedStatusSource {
    pub(crate) fn new(script: &[GatewayStatus]) -> Self {
        Self {
            script: script.iter().copied().collect(),
            last: GatewayStatus::Pending,
            polls: 0,
        }
    }

    pub(crate) fn always(status: GatewayStatus) -> Self {
        Self {
            script: Default::default(),
            last: status,
            polls: 0,
        }
    }
}

#[cfg(test)]
impl StatusSource for ScriptedStatusSource {
    fn poll(&mut self, _transaction_id: &str) -> GatewayStatus {
        self.polls += 1;
        if let Some(next) = self.script.pop_front() {
            self.last = next;
        }
        self.last
    }
}
