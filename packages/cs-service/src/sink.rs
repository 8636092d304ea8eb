//! Presentation collaborators. Calls are synchronous and must not re-enter the controller.

use std::sync::Arc;

use cs_domain::{AuthorProfile, Plot, ResultSet};

pub trait ResultSink
where
	Self: Send + Sync,
{
	fn show_results(&self, results: &ResultSet);

	fn show_author_profile(&self, profile: &AuthorProfile);

	fn show_empty(&self, message: &str);

	/// Replaces only the plot region. Idempotent.
	fn show_plot(&self, plot: &Plot);

	/// Resets to the initial placeholder.
	fn clear(&self, placeholder: &str);
}

pub trait Feedback
where
	Self: Send + Sync,
{
	/// A non-blocking notice, used for input the user can fix.
	fn notify(&self, message: &str);

	fn alert(&self, message: &str);

	fn show_busy(&self);

	fn hide_busy(&self);
}

/// The shareable address of the screen.
pub trait AddressBar
where
	Self: Send + Sync,
{
	fn replace(&self, query_string: &str);
}

#[derive(Clone)]
pub struct Presentation {
	pub sink: Arc<dyn ResultSink>,
	pub feedback: Arc<dyn Feedback>,
	pub address: Arc<dyn AddressBar>,
}

/// Shows the busy indicator on creation and hides it exactly once on drop.
pub(crate) struct BusyGuard<'a> {
	feedback: &'a dyn Feedback,
}
impl<'a> BusyGuard<'a> {
	pub(crate) fn show(feedback: &'a dyn Feedback) -> Self {
		feedback.show_busy();

		Self { feedback }
	}
}
impl Drop for BusyGuard<'_> {
	fn drop(&mut self) {
		self.feedback.hide_busy();
	}
}
