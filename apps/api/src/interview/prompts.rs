// All LLM prompt constants for the Interview module.
// Templates use {placeholder} slots filled with str::replace before sending.

/// Interview kickoff prompt — summarizes the résumé and produces the opening
/// question in one call. Replace `{resume_text}` and `{bio}` before sending.
pub const START_PROMPT_TEMPLATE: &str = r#"You are a senior technical interviewer conducting a mock interview.

Below are the candidate's résumé and a short bio they wrote about themselves.

RÉSUMÉ:
{resume_text}

CANDIDATE BIO:
{bio}

Do two things:
1. Summarize the résumé as 4-6 short bullet points covering the candidate's
   experience, core skills, and notable achievements.
2. Write the opening interview question. It must be specific to this
   candidate's background — never a generic "tell me about yourself".

Return a JSON object with this EXACT schema (no extra fields):
{
  "resumeSummary": [
    "5 years of backend experience, mostly Go and PostgreSQL",
    "Led migration of a monolith to services at Acme Corp"
  ],
  "firstQuestion": "Your résumé mentions leading the Acme migration — what drove that decision?"
}

Do NOT include any text outside the JSON object.
Do NOT use markdown code fences.
Do NOT include explanations or apologies."#;

/// Follow-up question prompt. Replace `{resume_summary}`, `{bio}`,
/// `{transcript}`, `{next_number}`, and `{total}` before sending.
pub const NEXT_QUESTION_PROMPT_TEMPLATE: &str = r#"You are a senior technical interviewer conducting a mock interview.

CANDIDATE BACKGROUND:
{resume_summary}

CANDIDATE BIO:
{bio}

INTERVIEW SO FAR:
{transcript}

Ask question {next_number} of {total}.

Rules:
- Build on the candidate's last answer where it left an opening; otherwise
  move to an unexplored area of their background.
- One question only. No multi-part questions.
- Do NOT repeat a question already asked.
- Keep it under 40 words.

Return ONLY the question text. No numbering, no preamble, no quotes, no JSON."#;

/// Post-interview analysis prompt. Replace `{resume_summary}` and
/// `{transcript}` before sending. Scores are 0-10.
pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"You are an interview coach evaluating a completed mock interview.

CANDIDATE BACKGROUND:
{resume_summary}

FULL TRANSCRIPT:
{transcript}

Evaluate the candidate's performance and return a JSON object with this EXACT schema (no extra fields):
{
  "summary": "Two or three sentences on overall performance.",
  "scores": {
    "technical": 7.5,
    "communication": 8.0,
    "confidence": 6.5
  },
  "strengths": [
    "Grounded answers in concrete production incidents"
  ],
  "weaknesses": [
    "Rarely quantified the impact of their work"
  ]
}

Rules:
- All three scores are numbers from 0 to 10.
- 2-4 strengths and 2-4 weaknesses, each a single short sentence.
- Judge only what is in the transcript — do not invent behavior.

Do NOT include any text outside the JSON object.
Do NOT use markdown code fences.
Do NOT include explanations or apologies."#;
