use crate::models::{FormStats, QuestionTallies, Response, TimelineEntry};
use chrono::{Local, TimeZone};
use std::fmt::Display;

const TIMELINE_DATE_FORMAT: &str = "%-m/%-d/%Y";

pub fn build_stats(responses: &[Response]) -> FormStats {
    build_stats_in(responses, &Local)
}

/// Aggregates one form's responses. The timeline holds one entry per
/// response, dated in `tz`; callers bucket by day themselves.
pub fn build_stats_in<Tz>(responses: &[Response], tz: &Tz) -> FormStats
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let submission_timeline = responses
        .iter()
        .map(|response| TimelineEntry {
            date: response
                .submitted_at
                .with_timezone(tz)
                .format(TIMELINE_DATE_FORMAT)
                .to_string(),
            count: 1,
        })
        .collect();

    let question_stats = (!responses.is_empty()).then(|| tally_answers(responses));

    FormStats {
        total_responses: responses.len(),
        submission_timeline,
        question_stats,
    }
}

fn tally_answers(responses: &[Response]) -> QuestionTallies {
    let mut tallies = QuestionTallies::new();
    for response in responses {
        for (question_id, answer) in &response.answers {
            let counts = tallies.entry(question_id.clone()).or_default();
            for value in answer.values() {
                let count = counts.entry(value.clone()).or_insert(0);
                *count = count.saturating_add(1);
            }
        }
    }
    tallies
}
