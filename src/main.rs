//! ROM Converter bundler - freezes rom_converter.py into standalone artifacts.
//!
//! Exit code 0 guarantees the primary artifact exists in `dist/`.

use std::process;

#[tokio::main]
async fn main() {
    let exit_code = match romconv_bundler::cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };

    process::exit(exit_code);
}
