//! taskboard view command: the interactive dashboard

use std::io::IsTerminal;

use super::GlobalOptions;
use crate::error::{Error, Result};
use crate::ui::dashboard;

pub struct ViewOptions {
    pub global: GlobalOptions,
}

pub fn run(options: ViewOptions) -> Result<()> {
    if options.global.output.json {
        return Err(Error::InvalidArgument(
            "view is interactive and does not support --json".to_string(),
        ));
    }
    if !std::io::stdout().is_terminal() {
        return Err(Error::InvalidArgument(
            "view needs an interactive terminal; use `taskboard board` or `taskboard table`"
                .to_string(),
        ));
    }

    let (config, _) = options.global.load_config()?;
    let client = options.global.client(&config)?;
    dashboard::run(&config, client)
}
