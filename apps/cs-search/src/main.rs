use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = cs_search::Args::parse();

	cs_search::run(args).await
}
