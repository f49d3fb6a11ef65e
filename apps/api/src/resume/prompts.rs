// Prompt constants for résumé analysis.

/// System instruction for résumé analysis: schema plus JSON-only output.
pub const RESUME_ANALYSIS_SYSTEM: &str = r#"You are a resume analyzer.
IMPORTANT: Only return valid JSON. No explanations, no extra text, no markdown code fences.
Required JSON schema:
{
  "name": string or null,
  "email": string or null,
  "phone": string or null,
  "experience_years": string,
  "skills": [string],
  "education": string or null,
  "previous_roles": [string],
  "key_projects": [string],
  "summary": string
}
"experience_years" is a range such as "0-1", "2-4" or "5+".
Use null for unknown scalar fields and [] for unknown lists."#;

/// Résumé analysis prompt. Replace `{resume_text}` before sending.
pub const RESUME_ANALYSIS_PROMPT_TEMPLATE: &str = "Resume Text:\n{resume_text}";
