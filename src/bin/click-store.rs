use std::process::ExitCode;

use click_store::app::ClickStoreApp;

#[tokio::main]
async fn main() -> ExitCode {
    match ClickStoreApp::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("click-store: {err}");
            ExitCode::FAILURE
        }
    }
}
