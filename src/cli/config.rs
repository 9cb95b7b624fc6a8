//! taskboard config commands
//!
//! `show` prints the effective configuration, `init` writes the defaults.

use std::path::PathBuf;

use super::GlobalOptions;
use crate::config::{Config, CONFIG_FILE_NAME};
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput};

pub struct ShowOptions {
    pub global: GlobalOptions,
}

pub struct InitOptions {
    pub path: Option<PathBuf>,
    pub force: bool,
    pub global: GlobalOptions,
}

#[derive(serde::Serialize)]
struct ShowReport {
    path: Option<PathBuf>,
    credentials: CredentialState,
    config: Config,
}

#[derive(serde::Serialize)]
struct CredentialState {
    token_id: bool,
    token_secret: bool,
}

#[derive(serde::Serialize)]
struct InitReport {
    path: PathBuf,
    overwritten: bool,
}

pub fn run_show(options: ShowOptions) -> Result<()> {
    let (config, path) = options.global.load_config()?;
    let credentials = &options.global.credentials;
    let report = ShowReport {
        path,
        credentials: CredentialState {
            token_id: credentials.token_id.is_some(),
            token_secret: credentials.token_secret.is_some(),
        },
        config,
    };

    let mut human = HumanOutput::new("taskboard config");
    human.push_summary(
        "file",
        report
            .path
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "(defaults)".to_string()),
    );
    human.push_summary("endpoint", report.config.upstream.endpoint.clone());
    human.push_summary("company", report.config.upstream.company.clone());
    human.push_summary("page size", report.config.upstream.page_size.to_string());
    human.push_summary("bucket size", report.config.board.bucket_size.to_string());
    human.push_summary(
        "staff",
        if report.config.board.track_all {
            "(everyone)".to_string()
        } else if report.config.board.staff.is_empty() {
            "(nobody)".to_string()
        } else {
            report.config.board.staff.join(", ")
        },
    );
    human.push_summary("stages", report.config.table.stage_order.join(" > "));
    if !report.credentials.token_id || !report.credentials.token_secret {
        human.push_warning("upstream credentials are not set");
        human.push_next_step("export TASKBOARD_TOKEN_ID and TASKBOARD_TOKEN_SECRET");
    }
    if report.path.is_none() {
        human.push_next_step("taskboard config init");
    }

    emit_success(options.global.output, "config show", &report, Some(&human))
}

pub fn run_init(options: InitOptions) -> Result<()> {
    let path = options
        .path
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
    let existed = path.exists();
    if existed && !options.force {
        return Err(Error::InvalidArgument(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }

    Config::default().save(&path)?;
    tracing::debug!(path = %path.display(), "wrote default config");

    let report = InitReport {
        path: path.clone(),
        overwritten: existed,
    };
    let mut human = HumanOutput::new(format!("Wrote {}", path.display()));
    if existed {
        human.push_warning("existing file was overwritten");
    }
    human.push_next_step(format!(
        "edit {} to set company ids and staff",
        path.display()
    ));

    emit_success(options.global.output, "config init", &report, Some(&human))
}
