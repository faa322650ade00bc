use forgent_core::TaskType;

/// The static task-type → agent-pipeline map.
///
/// Agent ids: 00 forensic, 01 architect, 02 builder, 03 designer,
/// 04 reviewer, 05 integrator, 09 qa.
pub fn pipeline_for(task_type: TaskType) -> Vec<String> {
    let ids: &[&str] = match task_type {
        TaskType::BuildFeature => &["00", "01", "02", "03", "04", "05", "09"],
        TaskType::FixBug => &["00", "02", "09", "05"],
        TaskType::Refactor => &["00", "04", "02", "05"],
        TaskType::Optimize => &["00", "02", "09"],
        TaskType::Scan => &["00"],
        TaskType::Test => &["09"],
        TaskType::Review => &["04"],
        TaskType::Design => &["00", "01"],
        TaskType::Plan => &["00", "01"],
        TaskType::Document => &["04"],
        TaskType::Explain => &["00"],
        TaskType::Deploy => &["00", "09"],
        TaskType::Install => &["00"],
        TaskType::Generic => &["00", "02"],
    };
    ids.iter().map(|s| (*s).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locked_pipelines() {
        assert_eq!(
            pipeline_for(TaskType::BuildFeature),
            vec!["00", "01", "02", "03", "04", "05", "09"]
        );
        assert_eq!(pipeline_for(TaskType::FixBug), vec!["00", "02", "09", "05"]);
        assert_eq!(pipeline_for(TaskType::Refactor), vec!["00", "04", "02", "05"]);
        assert_eq!(pipeline_for(TaskType::Optimize), vec!["00", "02", "09"]);
        assert_eq!(pipeline_for(TaskType::Scan), vec!["00"]);
        assert_eq!(pipeline_for(TaskType::Test), vec!["09"]);
        assert_eq!(pipeline_for(TaskType::Review), vec!["04"]);
        assert_eq!(pipeline_for(TaskType::Generic), vec!["00", "02"]);
    }

    #[test]
    fn test_every_task_type_has_a_pipeline() {
        for tt in [
            TaskType::Design,
            TaskType::Plan,
            TaskType::Document,
            TaskType::Explain,
            TaskType::Deploy,
            TaskType::Install,
        ] {
            assert!(!pipeline_for(tt).is_empty());
        }
    }
}
