//! Prompt builders.
//!
//! The model has no clock of its own, so every prompt that depends on "now"
//! states the timestamp and the named timezone explicitly.

use chrono::DateTime;
use chrono_tz::Tz;
use lifechat_core::record::{Event, Feeling};

/// `06/15/2025 09:30:00 AM CEST`
const STAMP_FORMAT: &str = "%m/%d/%Y %I:%M:%S %p %Z";

pub fn stamp(now: &DateTime<Tz>) -> String {
    now.format(STAMP_FORMAT).to_string()
}

/// Phase 1: pick and fill tools for the user's chat.
pub fn extraction_system(now: &DateTime<Tz>) -> String {
    format!(
        "Extract structured Event and Feeling data from a user chat log. \
         Make sure events are atomic and separated: call calendar_insert once per event, \
         with summary, start, end and timezone. \
         Call feeling_extract with the feelings the user expresses and a score from 1 to 10. \
         Use calendar_list only when the user asks about existing calendar entries. \
         Use timezone {tz}. It is {stamp}.",
        tz = now.timezone().name(),
        stamp = stamp(now),
    )
}

/// Phase 2: answer the user, based on what the tools did.
pub fn reply_system(now: &DateTime<Tz>, events_added: usize, feelings_recorded: usize) -> String {
    format!(
        "You are a warm journaling companion. Answer the user conversationally in a few sentences. \
         The tool results above show what happened: {events_added} calendar event(s) were added \
         and {feelings_recorded} feeling(s) were recorded. Tell the user what was added to their \
         calendar, and say so plainly if something failed or nothing was added. \
         Do not call any tools. Use timezone {tz}. It is {stamp}.",
        tz = now.timezone().name(),
        stamp = stamp(now),
    )
}

/// Restates the user's chat as the first user message of phase 2.
pub fn restate_request(chat: &str) -> String {
    format!("Original request: \"{chat}\"\nReply to this message.")
}

/// Drop one pair of double quotes wrapping the whole reply.
pub fn unquote(reply: &str) -> &str {
    let trimmed = reply.trim();
    match trimmed.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        Some(inner) if !inner.contains('"') => inner,
        _ => trimmed,
    }
}

pub const ADVICE_SYSTEM: &str = "You are a supportive life coach helping the user reach their goals \
     and keep their deadlines. Always format your responses in markdown.";

pub const MOTIVATION_SYSTEM: &str = "You are a motivational speaker. Create a short, inspiring \
     speech based on the user's events and feelings. Always format your responses in markdown.";

/// User message for advice over a period.
pub fn advice_request(events: &[Event], feelings: &[Feeling]) -> String {
    format!(
        "{}\n\nPlease provide personal, supportive advice based on these events and feelings. \
         Return a list of at most 3 advices, each as a markdown bullet point. \
         Do not preamble. Keep every advice concise and short.",
        period_summary(events, feelings)
    )
}

/// User message for a motivational speech over a period.
pub fn motivation_request(events: &[Event], feelings: &[Feeling]) -> String {
    format!(
        "{}\n\nPlease create a motivational speech of no more than three short paragraphs.",
        period_summary(events, feelings)
    )
}

fn period_summary(events: &[Event], feelings: &[Feeling]) -> String {
    let events = serde_json::to_string_pretty(events).unwrap_or_default();
    let feelings = serde_json::to_string_pretty(feelings).unwrap_or_default();
    format!("Here are my events:\n{events}\n\nAnd my feelings:\n{feelings}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use lifechat_core::record::parse_local_timestamp;

    fn summer_morning() -> DateTime<Tz> {
        chrono_tz::Europe::Berlin
            .with_ymd_and_hms(2025, 6, 15, 9, 30, 0)
            .unwrap()
    }

    #[test]
    fn stamp_names_the_zone() {
        assert_eq!(stamp(&summer_morning()), "06/15/2025 09:30:00 AM CEST");
    }

    #[test]
    fn extraction_prompt_carries_clock() {
        let prompt = extraction_system(&summer_morning());
        assert!(prompt.contains("Europe/Berlin"));
        assert!(prompt.contains("06/15/2025 09:30:00 AM CEST"));
        assert!(prompt.contains("calendar_insert"));
        assert!(prompt.contains("feeling_extract"));
    }

    #[test]
    fn reply_prompt_reports_counts() {
        let prompt = reply_system(&summer_morning(), 2, 1);
        assert!(prompt.contains("2 calendar event(s)"));
        assert!(prompt.contains("1 feeling(s)"));
        assert!(prompt.contains("Do not call any tools"));
    }

    #[test]
    fn advice_request_lists_records() {
        let at = parse_local_timestamp("2025-06-15T10:00:00").unwrap();
        let feeling = Feeling::new(["proud"], 8, at).unwrap();
        let event = Event::new(at, at, "Finished thesis", vec![], "Thesis").unwrap();
        let text = advice_request(&[event], &[feeling]);
        assert!(text.contains("Finished thesis"));
        assert!(text.contains("proud"));
        assert!(text.contains("at most 3"));
    }

    #[test]
    fn quoted_reply_is_unwrapped() {
        assert_eq!(unquote("\"Sounds like a great day!\""), "Sounds like a great day!");
        assert_eq!(unquote("  plain reply \n"), "plain reply");
        assert_eq!(unquote("He said \"hi\" to me"), "He said \"hi\" to me");
        assert_eq!(unquote("\"a\" and \"b\""), "\"a\" and \"b\"");
    }
}
