// self
use crate::obs::{OpKind, OpOutcome};

/// Counts gateway and session operations by kind and outcome (when enabled).
pub fn record_op_outcome(kind: OpKind, outcome: OpOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"docflow_client_op_total",
			"op" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Records how many parked requests one settled refresh released (when enabled).
///
/// The histogram is labeled with the refresh outcome so a burst of 401s that ended in a
/// forced sign-in is visible separately from a transparent rotation.
pub fn record_refresh_fan_out(waiters: usize, outcome: OpOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::histogram!(
			"docflow_client_refresh_waiters",
			"outcome" => outcome.as_str()
		)
		.record(waiters as f64);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (waiters, outcome);
	}
}
