use clap::Parser;

fn main() -> miette::Result<()> {
    jamplate_run::Cli::parse().run()
}
