pub mod terminal;

use std::{collections::BTreeMap, fs, path::PathBuf, sync::Arc};

use clap::{Parser, ValueEnum};
use color_eyre::eyre;
use tracing_subscriber::EnvFilter;

use crate::terminal::Terminal;
use cs_domain::{FileHandle, Mode, ParamValue, Target, Theme, Vote, params};
use cs_service::{
	PlotOutcome, Preferences, Providers, ResultTab, SearchController, SearchOutcome,
};

#[derive(Debug, Parser)]
#[command(
	version = cs_cli::VERSION,
	rename_all = "kebab",
	styles = cs_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// A shared query string to restore, with or without the leading `?`.
	#[arg(long, default_value = "", value_name = "QUERY")]
	pub address: String,
	#[command(flatten)]
	pub input: InputArgs,
	#[arg(long, short = 't', value_name = "TARGET")]
	pub target: Option<Target>,
	/// A hyperparameter as `key=value`. List parameters may repeat.
	#[arg(long = "param", short = 'p', value_name = "KEY=VALUE")]
	pub params: Vec<String>,
	/// Shows (and remembers) the advanced options.
	#[arg(long, value_name = "BOOL")]
	pub advanced: Option<bool>,
	#[arg(long, value_name = "THEME")]
	pub theme: Option<Theme>,
	/// Fetches the plot for the displayed results.
	#[arg(long)]
	pub plot: bool,
	/// Opens the profile of one author instead of searching.
	#[arg(long, value_name = "ID")]
	pub author: Option<String>,
	#[arg(long, value_enum, value_name = "VOTE")]
	pub vote: Option<VoteArg>,
	/// Lists the organizational units usable as `filter_unit` and exits.
	#[arg(long)]
	pub list_units: bool,
	/// Prints results as JSON lines.
	#[arg(long)]
	pub json: bool,
}

#[derive(Debug, Default, clap::Args)]
#[group(multiple = false)]
pub struct InputArgs {
	#[arg(long, value_name = "TEXT")]
	pub text: Option<String>,
	#[arg(long, value_name = "NAME")]
	pub name: Option<String>,
	#[arg(long, value_name = "URL")]
	pub url: Option<String>,
	#[arg(long, value_name = "FILE")]
	pub pdf: Option<PathBuf>,
}
impl InputArgs {
	pub fn is_given(&self) -> bool {
		self.text.is_some() || self.name.is_some() || self.url.is_some() || self.pdf.is_some()
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum VoteArg {
	Up,
	Down,
}
impl From<VoteArg> for Vote {
	fn from(value: VoteArg) -> Self {
		match value {
			VoteArg::Up => Self::Up,
			VoteArg::Down => Self::Down,
		}
	}
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = cs_config::load(&args.config)?;
	init_tracing(&config)?;
	let fetch_defaults = config.search.fetch_default_settings;
	let preferences = Arc::new(Preferences::from_config(&config.preferences)?);
	let terminal = Arc::new(Terminal::new(args.json));
	let controller = SearchController::open(
		config,
		Providers::default(),
		terminal.presentation(),
		preferences,
		&args.address,
	);

	if let Some(theme) = args.theme {
		controller.set_theme(theme)?;
	}
	if args.list_units {
		for (id, name) in controller.units().await? {
			println!("{id}\t{name}");
		}

		return Ok(());
	}

	apply(&controller, &args)?;

	let outcome = if let Some(author_id) = args.author.as_deref() {
		Some(controller.open_author(author_id).await)
	} else if args.input.is_given() {
		if fetch_defaults && let Err(err) = controller.load_default_settings().await {
			tracing::warn!(error = %err, "Failed to load default settings.");
		}

		Some(controller.search().await)
	} else {
		controller.on_load().await
	};

	match outcome {
		Some(SearchOutcome::Failed(err)) => return Err(err.into()),
		Some(SearchOutcome::Displayed { .. }) => follow_up(&controller, &args).await?,
		Some(_) => {},
		None => terminal.placeholder(),
	}

	println!("?{}", terminal.address());

	Ok(())
}

/// Applies the command-line edits to the restored state, in the order a user would make them.
pub fn apply(controller: &SearchController, args: &Args) -> color_eyre::Result<()> {
	if let Some(advanced) = args.advanced {
		controller.set_advanced(advanced)?;
	}
	if let Some(target) = args.target {
		controller.set_target(target);
	}

	let input = &args.input;

	if let Some(text) = input.text.as_deref() {
		set_typed(controller, Mode::Text, text);
	} else if let Some(name) = input.name.as_deref() {
		set_typed(controller, Mode::Name, name);
	} else if let Some(url) = input.url.as_deref() {
		set_typed(controller, Mode::Url, url);
	} else if let Some(path) = input.pdf.as_ref() {
		let bytes = fs::read(path)
			.map_err(|err| eyre::eyre!("Failed to read {}: {err}.", path.display()))?;
		let name = path
			.file_name()
			.map(|name| name.to_string_lossy().into_owned())
			.unwrap_or_else(|| "upload.pdf".to_string());

		controller.set_file(Some(FileHandle::new(name, bytes)));
	}

	for (key, value) in parse_params(&args.params)? {
		controller.set_param(&key, value);
	}

	Ok(())
}

/// Parses `key=value` pairs. Registered parameters are typed by the registry; repeated list
/// values accumulate; unknown keys are kept as text.
pub fn parse_params(raw: &[String]) -> color_eyre::Result<Vec<(String, ParamValue)>> {
	let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();

	for pair in raw {
		let Some((key, value)) = pair.split_once('=') else {
			return Err(eyre::eyre!("Parameter {pair:?} must look like key=value."));
		};
		let key = key.trim();

		if key.is_empty() {
			return Err(eyre::eyre!("Parameter {pair:?} has an empty key."));
		}

		grouped.entry(key.to_string()).or_default().push(value.trim().to_string());
	}

	grouped
		.into_iter()
		.map(|(key, values)| {
			let value = match params::spec(&key) {
				Some(spec) if spec.kind == params::ParamKind::List =>
					ParamValue::List(values.into_iter().filter(|v| !v.is_empty()).collect()),
				Some(spec) => {
					let last = values.last().map(String::as_str).unwrap_or_default();

					spec.parse(last).ok_or_else(|| {
						eyre::eyre!("Parameter {key} does not accept {last:?}.")
					})?
				},
				None => ParamValue::Text(values.join(",")),
			};

			Ok((key, value))
		})
		.collect()
}

async fn follow_up(controller: &SearchController, args: &Args) -> color_eyre::Result<()> {
	if args.plot {
		match controller.select_tab(ResultTab::Plot).await {
			PlotOutcome::Failed(err) => return Err(err.into()),
			PlotOutcome::Unavailable => tracing::info!("No plot is available for these results."),
			_ => {},
		}
	}
	if let Some(vote) = args.vote {
		controller.vote(vote.into()).await?;
	}

	Ok(())
}

fn set_typed(controller: &SearchController, mode: Mode, text: &str) {
	controller.update(|state| {
		state.set_mode(mode);
		state.set_text(text);
	});
}

fn init_tracing(config: &cs_config::Config) -> color_eyre::Result<()> {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
	Ok(())
}
