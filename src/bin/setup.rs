use anyhow::Result;

fn main() -> Result<()> {
    cubotino_deploy::cli::run(cubotino_deploy::cli::CliMode::Setup)
}
