//! Instruction and user-message construction for roadmap generation.
//!
//! Pure string assembly: nothing here talks to a provider.

use pathly_db::models::Difficulty;

use super::request::{ContentRatio, DEFAULT_DAILY_TIME_MINUTES, GenerationRequest};
use crate::provider::GenerationPrompt;

/// Output contract included in every instruction.
const OUTPUT_FORMAT: &str = r#"## OUTPUT FORMAT (JSON ONLY)
Return ONLY valid JSON matching this structure:
{
  "skill": "",
  "difficulty": "",
  "duration_days": 0,
  "weeks": [
    {
      "week": 1,
      "focus": "",
      "modules": [
        {
          "module_id": "W1-M1",
          "title": "",
          "objective": "",
          "learning_type": "theory|practice|project",
          "difficulty_tag": "beginner|intermediate|expert",
          "estimated_time_minutes": 0,
          "sequence_order": 1,
          "tasks": [
            {
              "title": "",
              "contentType": "reading|video|project|exercise",
              "description": "",
              "contentLink": ""
            }
          ]
        }
      ]
    }
  ]
}
"#;

const PEDAGOGICAL_RULES: &str = "## PEDAGOGICAL RULES
* Concepts must follow logical progression
* No jumping ahead: never reference a concept before the module that teaches it
* Dependencies must be respected
* Each module must build on previous ones
* sequence_order starts at 1 in every week and increases by one per module
";

const FORBIDDEN: &str = "## STRICTLY FORBIDDEN
* No markdown, no code fences
* No explanations outside JSON
* No extra fields beyond the structure
* No emojis
* Output must be parsable JSON only
";

/// Difficulty rules, one block per level, always listed in full so the
/// generator sees the contrast between levels.
fn difficulty_rules() -> String {
    let mut rules = String::from("## DIFFICULTY RULES (MANDATORY)\n\n");
    for difficulty in Difficulty::ALL {
        rules.push_str(&format!("**{}**\n", difficulty.label()));
        let lines: &[&str] = match difficulty {
            Difficulty::Beginner => &[
                "70% fundamentals",
                "Simple explanations",
                "No assumptions of prior knowledge",
            ],
            Difficulty::Intermediate => &[
                "50% practice",
                "Some prior knowledge assumed",
                "Include applied tasks",
            ],
            Difficulty::Expert => &[
                "70% practice/projects",
                "Real-world focus",
                "Optimization, edge cases, mastery tasks",
            ],
        };
        for line in lines {
            rules.push_str(&format!("* {line}\n"));
        }
        rules.push('\n');
    }
    rules
}

/// Build the system instruction for one request.
///
/// The daily budget is embedded as a hard limit; everything else is fixed
/// per difficulty rules.
pub fn build_instruction(req: &GenerationRequest) -> String {
    let mut prompt = String::with_capacity(4096);

    prompt.push_str("You are an expert curriculum architect and instructional designer.\n\n");
    prompt.push_str(
        "Your task is to generate a structured, time-bound learning roadmap \
         and convert it into modules for a skill-learning platform called \"PathLy\".\n\n",
    );
    prompt.push_str(
        "You MUST follow all constraints strictly. Your output will be consumed by \
         software -- do NOT add explanations, marketing language, or casual text.\n\n",
    );

    prompt.push_str(&difficulty_rules());

    prompt.push_str("## TIME CONSTRAINT RULE\n");
    prompt.push_str(&format!(
        "* Total estimated time per day MUST NOT exceed {} minutes (daily_time_minutes)\n",
        req.daily_time_minutes()
    ));
    prompt.push_str(
        "* No single module may have estimated_time_minutes above daily_time_minutes\n\
         * The estimated_time_minutes of all modules in one week together MUST NOT exceed \
         daily_time_minutes\n",
    );
    prompt.push_str(&format!(
        "* If minutes are not provided: Assume {DEFAULT_DAILY_TIME_MINUTES} minutes/day\n\n"
    ));

    prompt.push_str(&format!(
        "## DURATION RULE\n* Use exactly {} week(s), numbered 1 to {}\n\n",
        req.week_count(),
        req.week_count()
    ));

    prompt.push_str(PEDAGOGICAL_RULES);
    prompt.push('\n');
    prompt.push_str(OUTPUT_FORMAT);
    prompt.push('\n');
    prompt.push_str(FORBIDDEN);
    prompt.push('\n');

    prompt.push_str("## QUALITY VALIDATION (SELF-CHECK)\n");
    prompt.push_str("Before returning output, verify:\n");
    prompt.push_str("* Total modules fit within duration\n");
    prompt.push_str("* Time limits are respected\n");
    prompt.push_str("* Difficulty distribution is correct\n");
    prompt.push_str("* Output JSON is valid and parsable\n");

    prompt
}

/// Build the user message describing the requested roadmap.
pub fn build_user_message(req: &GenerationRequest) -> String {
    let (theory, practice, project) =
        ContentRatio::for_difficulty(req.difficulty()).percentages();
    format!(
        "Generate a learning roadmap for:\n\
         skill_name: {}\n\
         duration_days: {}\n\
         difficulty_level: {}\n\
         daily_time_minutes: {}\n\
         target_mix: {theory}% theory, {practice}% practice, {project}% project\n\n\
         Return ONLY the JSON response, no other text.",
        req.skill_name(),
        req.duration_days(),
        req.difficulty().label(),
        req.daily_time_minutes(),
    )
}

/// Build the full prompt, requesting structured (JSON) output.
pub fn build_prompt(req: &GenerationRequest) -> GenerationPrompt {
    GenerationPrompt {
        instruction: build_instruction(req),
        user_message: build_user_message(req),
        json_output: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(difficulty: Difficulty) -> GenerationRequest {
        GenerationRequest::with_daily_time("Guitar", 30, difficulty, 45).unwrap()
    }

    #[test]
    fn instruction_lists_every_difficulty_rule() {
        let prompt = build_instruction(&request(Difficulty::Beginner));
        assert!(prompt.contains("**Beginner**"));
        assert!(prompt.contains("70% fundamentals"));
        assert!(prompt.contains("**Intermediate**"));
        assert!(prompt.contains("50% practice"));
        assert!(prompt.contains("**Expert**"));
        assert!(prompt.contains("70% practice/projects"));
    }

    #[test]
    fn instruction_embeds_daily_budget_and_weeks() {
        let prompt = build_instruction(&request(Difficulty::Expert));
        assert!(prompt.contains("MUST NOT exceed 45 minutes"));
        assert!(prompt.contains("all modules in one week together MUST NOT exceed"));
        assert!(prompt.contains("Use exactly 5 week(s), numbered 1 to 5"));
    }

    #[test]
    fn instruction_contains_output_contract() {
        let prompt = build_instruction(&request(Difficulty::Intermediate));
        assert!(prompt.contains("OUTPUT FORMAT (JSON ONLY)"));
        assert!(prompt.contains("\"estimated_time_minutes\""));
        assert!(prompt.contains("No extra fields beyond the structure"));
        assert!(prompt.contains("No markdown"));
        assert!(prompt.contains("No jumping ahead"));
    }

    #[test]
    fn user_message_carries_request_fields() {
        let msg = build_user_message(&request(Difficulty::Expert));
        assert!(msg.contains("skill_name: Guitar"));
        assert!(msg.contains("duration_days: 30"));
        assert!(msg.contains("difficulty_level: Expert"));
        assert!(msg.contains("daily_time_minutes: 45"));
        assert!(msg.contains("target_mix: 10% theory, 40% practice, 50% project"));
    }

    #[test]
    fn prompt_requests_json_output() {
        let prompt = build_prompt(&request(Difficulty::Beginner));
        assert!(prompt.json_output);
        assert!(!prompt.instruction.is_empty());
        assert!(!prompt.user_message.is_empty());
    }
}
