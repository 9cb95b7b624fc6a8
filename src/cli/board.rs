//! taskboard board command implementation

use serde::Serialize;

use super::load::{self, LoadSummary, PageLimit};
use super::GlobalOptions;
use crate::board::AssigneeBucket;
use crate::error::Result;
use crate::output::HumanOutput;
use crate::paging::Coordinator;
use crate::record::description_line;

pub struct BoardOptions {
    pub pages: PageLimit,
    pub global: GlobalOptions,
}

#[derive(Serialize)]
struct BoardReport<'a> {
    bucket_size: usize,
    assignees: Vec<BucketView<'a>>,
    load: LoadSummary,
}

#[derive(Serialize)]
struct BucketView<'a> {
    assignee_id: &'a str,
    name: String,
    tasks: &'a [crate::record::NormalizedTask],
}

impl<'a> From<&'a AssigneeBucket> for BucketView<'a> {
    fn from(bucket: &'a AssigneeBucket) -> Self {
        Self {
            assignee_id: &bucket.assignee.id,
            name: bucket.assignee.display_name(),
            tasks: &bucket.tasks,
        }
    }
}

pub fn run(options: BoardOptions) -> Result<()> {
    let (config, _) = options.global.load_config()?;
    let description_max = config.table.description_max_len;
    let client = options.global.client(&config)?;
    let mut coordinator = Coordinator::from_config(&config);
    let mut summary = load::load_pages(&mut coordinator, &client, options.pages)?;
    let failure = summary.take_failure();

    let board = coordinator.board();
    let report = BoardReport {
        bucket_size: board.bucket_size(),
        assignees: board.buckets().iter().map(BucketView::from).collect(),
        load: summary,
    };

    let mut human = HumanOutput::new(format!("Board: {} assignee(s)", report.assignees.len()));
    load::describe(&report.load, &mut human);
    for bucket in &report.assignees {
        human.push_detail(bucket.name.clone());
        for task in bucket.tasks {
            human.push_detail(format!("  [{}] {}", task.priority, task.title));
            human.push_detail(format!(
                "      {}",
                description_line(&task.description, description_max)
            ));
        }
    }

    load::emit(options.global.output, "board", &report, &human, failure)
}
