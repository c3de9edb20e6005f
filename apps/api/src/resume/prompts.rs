// Resume analyzer prompt templates.

pub const RESUME_ANALYSIS_INSTRUCTION: &str = "\
You are an experienced technical recruiter and resume reviewer. \
Score the resume honestly and give specific, actionable feedback. \
Scores are integers from 0 to 100.";

/// Replace `{resume_text}` before sending.
pub const RESUME_ANALYSIS_PROMPT: &str = r#"Analyze the resume below.

Return a JSON object with this EXACT schema (no extra fields, no extra sections):
{
  "overall_score": 78,
  "overall_feedback": "One short paragraph on the resume as a whole.",
  "summary_comment": "One sentence a recruiter would say after a first read.",
  "sections": {
    "contact_info": {
      "score": 90,
      "comment": "Short assessment of this section.",
      "whats_good": ["..."],
      "needs_improvement": ["..."],
      "tips_for_improvement": ["..."]
    },
    "experience": { "score": 0, "comment": "", "whats_good": [], "needs_improvement": [], "tips_for_improvement": [] },
    "education": { "score": 0, "comment": "", "whats_good": [], "needs_improvement": [], "tips_for_improvement": [] },
    "skills": { "score": 0, "comment": "", "whats_good": [], "needs_improvement": [], "tips_for_improvement": [] }
  },
  "whats_good": ["Strengths of the resume overall"],
  "needs_improvement": ["Weaknesses of the resume overall"],
  "tips_for_improvement": ["Concrete next steps"]
}

Rules:
- "sections" contains exactly contact_info, experience, education and skills.
- Every score is an integer between 0 and 100.
- If a section is missing from the resume, score it low and say so in its comment.
- Base every point on the resume text. Do not invent employers, dates or skills.

RESUME TEXT:
{resume_text}"#;
