#[macro_use]
extern crate rust_i18n;

i18n!("locales");

use rangelog::cli;
use rangelog::error::RangelogError;
use rangelog::init_locale;

fn main() {
    init_locale();

    if let Err(e) = cli::run() {
        let message = e
            .downcast_ref::<RangelogError>()
            .map(RangelogError::display_localized)
            .unwrap_or_else(|| format!("{e:#}"));
        eprintln!("{}", t!("messages.error", error = message));
        std::process::exit(1);
    }
}
