use anyhow::Result;
use parlor::app::App;
use parlor::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    config.validate()?;

    let mut app = App::new(config).await?;
    app.run().await
}
