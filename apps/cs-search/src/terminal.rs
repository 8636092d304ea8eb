//! Writes the search screen to a terminal. Results go to stdout, notices to stderr.

use std::sync::{Arc, Mutex};

use serde_json::Value;

use cs_domain::{AuthorProfile, Plot, RankedItems, ResultSet};
use cs_service::{AddressBar, Feedback, Presentation, ResultSink};

pub struct Terminal {
	json: bool,
	address: Mutex<String>,
	placeholder: Mutex<Option<String>>,
}
impl Terminal {
	pub fn new(json: bool) -> Self {
		Self { json, address: Mutex::new(String::new()), placeholder: Mutex::new(None) }
	}

	pub fn presentation(self: &Arc<Self>) -> Presentation {
		Presentation { sink: self.clone(), feedback: self.clone(), address: self.clone() }
	}

	/// The last address the controller published.
	pub fn address(&self) -> String {
		self.address.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}

	/// Prints the placeholder from the most recent `clear`, if any.
	pub fn placeholder(&self) {
		if let Some(text) = self.placeholder.lock().unwrap_or_else(|err| err.into_inner()).as_ref() {
			println!("{text}");
		}
	}
}
impl ResultSink for Terminal {
	fn show_results(&self, results: &ResultSet) {
		if self.json {
			match &results.items {
				RankedItems::Authors(authors) =>
					authors.iter().for_each(|author| print_json(author)),
				RankedItems::Articles(articles) =>
					articles.iter().for_each(|article| print_json(article)),
			}

			return;
		}

		for line in result_lines(results) {
			println!("{line}");
		}
	}

	fn show_author_profile(&self, profile: &AuthorProfile) {
		if self.json {
			print_json(&profile.author);
			profile.articles.iter().for_each(print_json);

			return;
		}

		for line in profile_lines(profile) {
			println!("{line}");
		}
	}

	fn show_empty(&self, message: &str) {
		println!("{message}");
	}

	fn show_plot(&self, plot: &Plot) {
		match &plot.0 {
			Value::String(raw) => println!("plot: {raw}"),
			value => println!("plot: {value}"),
		}
	}

	fn clear(&self, placeholder: &str) {
		*self.placeholder.lock().unwrap_or_else(|err| err.into_inner()) =
			Some(placeholder.to_string());
	}
}
impl Feedback for Terminal {
	fn notify(&self, message: &str) {
		eprintln!("{message}");
	}

	fn alert(&self, message: &str) {
		eprintln!("error: {message}");
	}

	fn show_busy(&self) {
		tracing::debug!("Busy.");
	}

	fn hide_busy(&self) {
		tracing::debug!("Idle.");
	}
}
impl AddressBar for Terminal {
	fn replace(&self, query: &str) {
		*self.address.lock().unwrap_or_else(|err| err.into_inner()) = query.to_string();
	}
}

fn print_json<T>(value: &T)
where
	T: serde::Serialize + ?Sized,
{
	match serde_json::to_string(value) {
		Ok(line) => println!("{line}"),
		Err(err) => tracing::warn!(error = %err, "Failed to encode a result."),
	}
}

fn result_lines(results: &ResultSet) -> Vec<String> {
	match &results.items {
		RankedItems::Authors(authors) => authors
			.iter()
			.enumerate()
			.map(|(rank, author)| {
				let mut line = format!("{:>3}. {} [{}]", rank + 1, author.display_name(), author.id);

				if let Some(community) = author.community_name.as_deref() {
					line.push_str(&format!(" {community}"));
				}
				if let Some(score) = author.score {
					line.push_str(&format!(" score={score:.3}"));
				}

				line
			})
			.collect(),
		RankedItems::Articles(articles) => articles
			.iter()
			.enumerate()
			.map(|(rank, article)| {
				let mut line = format!("{:>3}. {} doi:{}", rank + 1, article.title, article.doi);

				if let Some(distance) = article.distance {
					line.push_str(&format!(" distance={distance:.3}"));
				}

				line
			})
			.collect(),
	}
}

fn profile_lines(profile: &AuthorProfile) -> Vec<String> {
	let mut lines = vec![format!("{} [{}]", profile.author.display_name(), profile.author.id)];

	if let Some(community) = profile.author.community_name.as_deref() {
		lines.push(community.to_string());
	}

	for article in &profile.articles {
		let title = article.get("title").and_then(Value::as_str).unwrap_or("(untitled)");

		match article.get("doi").and_then(Value::as_str) {
			Some(doi) => lines.push(format!("  - {title} doi:{doi}")),
			None => lines.push(format!("  - {title}")),
		}
	}

	lines
}
