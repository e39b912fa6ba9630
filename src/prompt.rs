use std::fmt::Write as _;

use crate::form::FormSummary;
use crate::prediction::MatchContext;
use crate::provider::ChatMessage;

pub fn system_prompt() -> String {
    "You are a football match analyst writing predictions for a fan engagement app.\n\
     \n\
     Use the recent form, streaks and standings you are given. Be realistic: home \
     advantage is worth a few points, draws are common, and nobody is ever certain.\n\
     \n\
     Reply with a single JSON object and nothing else, in exactly this shape:\n\
     {\n\
       \"homeWin\": <integer 0-100>,\n\
       \"draw\": <integer 0-100>,\n\
       \"awayWin\": <integer 0-100>,\n\
       \"predictedScore\": {\"home\": <integer 0-5>, \"away\": <integer 0-4>},\n\
       \"confidence\": <integer 55-85>,\n\
       \"analysis\": \"<one to three sentences>\",\n\
       \"keyFactors\": [\"<short label>\", \"<short label>\", \"<short label>\"]\n\
     }\n\
     \n\
     homeWin + draw + awayWin must equal 100. Give three or four keyFactors, most important first."
        .to_string()
}

/// Data message describing one fixture.
pub fn build_match_prompt(ctx: &MatchContext) -> String {
    let mut prompt = String::with_capacity(512);

    let _ = writeln!(prompt, "## FIXTURE");
    let _ = writeln!(prompt, "Home: {}", ctx.home_team);
    let _ = writeln!(prompt, "Away: {}", ctx.away_team);
    if let Some(comp) = ctx.competition.as_deref() {
        let _ = writeln!(prompt, "Competition: {comp}");
    }
    prompt.push('\n');

    let _ = writeln!(prompt, "## RECENT FORM (most recent first)");
    let _ = writeln!(prompt, "{}", form_line(&ctx.home_team, &ctx.home_form));
    let _ = writeln!(prompt, "{}", form_line(&ctx.away_team, &ctx.away_form));

    if ctx.home_rank.is_some() || ctx.away_rank.is_some() {
        prompt.push('\n');
        let _ = writeln!(prompt, "## STANDINGS");
        let _ = writeln!(prompt, "{}: {}", ctx.home_team, rank_label(ctx.home_rank));
        let _ = writeln!(prompt, "{}: {}", ctx.away_team, rank_label(ctx.away_rank));
    }

    prompt.push('\n');
    prompt.push_str("Predict the result as JSON.");
    prompt
}

pub fn build_messages(ctx: &MatchContext) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(system_prompt()),
        ChatMessage::user(build_match_prompt(ctx)),
    ]
}

fn form_line(team: &str, form: &FormSummary) -> String {
    if !form.is_known() {
        return format!("{team}: no recent form available");
    }
    let results = if form.last_results.is_empty() {
        "-".to_string()
    } else {
        form.results_string()
    };
    format!(
        "{team}: {results} | form score {:.0}/100 | win streak {} | unbeaten {}",
        form.form_score, form.win_streak, form.unbeaten_streak
    )
}

fn rank_label(rank: Option<u32>) -> String {
    match rank {
        Some(r) => ordinal(r),
        None => "unknown".to_string(),
    }
}

fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{FormInput, MatchOutcome, MatchResult};
    use crate::prediction::PredictionRequest;
    use crate::provider::ChatRole;

    fn request() -> PredictionRequest {
        PredictionRequest {
            competition: Some("Premier League".to_string()),
            home_form: Some(FormInput {
                form_score: None,
                last_results: vec![
                    MatchResult::new(MatchOutcome::Win, 2, 0),
                    MatchResult::new(MatchOutcome::Win, 1, 0),
                    MatchResult::new(MatchOutcome::Draw, 1, 1),
                ],
            }),
            home_rank: Some(2),
            away_rank: Some(11),
            ..PredictionRequest::new("Arsenal", "Everton")
        }
    }

    #[test]
    fn prompt_embeds_form_and_context() {
        let ctx = MatchContext::from_request(&request());
        let prompt = build_match_prompt(&ctx);
        assert!(prompt.contains("Home: Arsenal"));
        assert!(prompt.contains("Competition: Premier League"));
        assert!(prompt.contains("Arsenal: W W D"));
        assert!(prompt.contains("win streak 2"));
        assert!(prompt.contains("Everton: no recent form available"));
        assert!(prompt.contains("Arsenal: 2nd"));
        assert!(prompt.contains("Everton: 11th"));
    }

    #[test]
    fn optional_sections_are_omitted() {
        let ctx = MatchContext::from_request(&PredictionRequest::new("Lyon", "Nice"));
        let prompt = build_match_prompt(&ctx);
        assert!(!prompt.contains("Competition:"));
        assert!(!prompt.contains("## STANDINGS"));
    }

    #[test]
    fn two_message_exchange() {
        let ctx = MatchContext::from_request(&request());
        let messages = build_messages(&ctx);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, ChatRole::System);
        assert!(messages[0].content.contains("homeWin"));
        assert_eq!(messages[1].role, ChatRole::User);
    }

    #[test]
    fn ordinals() {
        assert_eq!(ordinal(1), "1st");
        assert_eq!(ordinal(3), "3rd");
        assert_eq!(ordinal(12), "12th");
        assert_eq!(ordinal(22), "22nd");
        assert_eq!(ordinal(111), "111th");
    }
}
