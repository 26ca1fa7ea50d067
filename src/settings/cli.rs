use super::Parser;

#[derive(Parser, Debug)]
#[command(name = "offgrant", about = "Offline access token service")]
pub struct Cli {
    /// Settings file path. The extension may be omitted.
    #[arg(long)]
    pub settings: Option<String>,
}
