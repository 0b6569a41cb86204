fn main() -> anyhow::Result<()> {
    let result = rawtty_cli::app::run();

    // Flush before any error is printed so it lands on a clean line
    use std::io::{self, Write};
    let _ = io::stderr().flush();
    let _ = io::stdout().flush();

    result
}
