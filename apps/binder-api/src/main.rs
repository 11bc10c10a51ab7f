use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = binder_api::Args::parse();

	binder_api::run(args).await
}
