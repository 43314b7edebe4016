// self
use crate::{_prelude::*, obs::CallKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedCall<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedCall<F> = F;

/// A span wrapped around one dispatcher call, retry included.
#[derive(Clone, Debug)]
pub struct CallSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl CallSpan {
	/// Creates a new span tagged with the call kind, method, and relative path.
	pub fn new(kind: CallKind, method: &Method, path: &str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"sendpulse.call",
				kind = kind.as_str(),
				method = method.as_str(),
				path
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, method, path);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedCall<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a warning that the API rejected the bearer token sent to `url`.
///
/// `replayed` marks the rejection of the fresh token on the retry, which is surfaced instead of
/// retried again.
pub fn note_token_rejected(url: &str, replayed: bool) {
	#[cfg(feature = "tracing")]
	{
		if replayed {
			tracing::warn!(url, "bearer token rejected again; invalidating and giving up");
		} else {
			tracing::warn!(url, "bearer token rejected; invalidating and retrying once");
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (url, replayed);
	}
}

/// Emits a debug event once a fresh token has been cached.
pub fn note_token_fetched() {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!("bearer token fetched and cached");
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn call_span_noop_without_tracing() {
		let _span = CallSpan::new(CallKind::Api, &Method::GET, "/addressbooks");

		note_token_rejected("https://api.example.com/addressbooks", false);
		note_token_rejected("https://api.example.com/addressbooks", true);
		note_token_fetched();
	}

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = CallSpan::new(CallKind::Token, &Method::POST, "/oauth/access_token");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
