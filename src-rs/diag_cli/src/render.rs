use crate::models::{Report, TaskView};

pub fn submitted(task_id: &str, message: &str) {
    println!("{}", message);
    println!("task id: {}", task_id);
}

pub fn waiting(view: &TaskView, attempt: u32) {
    println!(
        "[{}] {} {}",
        attempt,
        view.status,
        view.message.clone().unwrap_or_default()
    );
}

pub fn task(view: &TaskView) {
    println!("task:      {}", view.task_id);
    println!("status:    {}", view.status);
    println!("submitted: {}", view.submitted_at);
    if let Some(done) = &view.completed_at {
        println!("completed: {}", done);
    }
    if !view.problem_text.is_empty() {
        println!("problem:   {}", view.problem_text);
    }
    if let Some(message) = &view.message {
        println!("{}", message);
    }
    if let Some(err) = &view.error_message {
        println!("error:     {}", err);
    }
    if let Some(report) = &view.report {
        println!();
        self::report(report);
    }
}

pub fn report(report: &Report) {
    println!("{}", report.summary);
    println!("confidence: {:.0}%", report.confidence_score * 100.0);
    for item in &report.analysis {
        println!("  - {} [{}]", item.component, item.status);
        println!("      {}", item.details);
        println!("      -> {}", item.recommendation);
    }
    list("potential causes", &report.potential_causes);
    list("suggested solutions", &report.suggested_solutions);
}

fn list(title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!("{}:", title);
    for item in items {
        println!("  * {}", item);
    }
}

pub fn tasks(tasks: &[TaskView]) {
    if tasks.is_empty() {
        println!("no tasks");
        return;
    }
    for task in tasks {
        println!("[{}] {} - {}", task.status, task.task_id, task.problem_text);
    }
}
