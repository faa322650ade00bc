use forgent_agent::AgentDescriptor;
use forgent_core::Task;

/// Assembles the bounded context bundle handed to the reasoning
/// engine for one step: agent body, analyzer summary, skill bodies
/// (truncated to the character budget), prior step summaries, and the
/// task itself.
pub fn build_context(
    agent: &AgentDescriptor,
    report_summary: &str,
    skills: &[(String, String)],
    prior_summaries: &[String],
    task: &Task,
    skill_budget: usize,
) -> String {
    let mut bundle = String::new();

    if !agent.content.is_empty() {
        bundle.push_str(&agent.content);
        bundle.push_str("\n\n");
    } else {
        bundle.push_str(&format!("You are agent {} ({}).\n\n", agent.id, agent.role));
    }

    bundle.push_str("## Project analysis\n");
    bundle.push_str(report_summary);
    bundle.push_str("\n\n");

    if !skills.is_empty() {
        bundle.push_str("## Relevant skills\n");
        let mut remaining = skill_budget;
        for (name, body) in skills {
            if remaining == 0 {
                break;
            }
            let take = body.len().min(remaining);
            let mut end = take;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            bundle.push_str(&format!("### {name}\n{}\n\n", &body[..end]));
            remaining -= end;
        }
    }

    if !prior_summaries.is_empty() {
        bundle.push_str("## Earlier steps\n");
        for (idx, summary) in prior_summaries.iter().enumerate() {
            bundle.push_str(&format!("{}. {summary}\n", idx + 1));
        }
        bundle.push('\n');
    }

    bundle.push_str(&format!(
        "## Task\ntype: {}\nrequest: {}\n",
        task.task_type, task.raw_query
    ));
    if let Some(subject) = task.subject() {
        bundle.push_str(&format!("subject: {subject}\n"));
    }

    bundle
}
