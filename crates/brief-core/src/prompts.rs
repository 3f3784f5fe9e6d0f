use crate::models::SummaryMode;

const STANDARD_TEMPLATE: &str = r#"You are an expert news analyst. Create a comprehensive summary of the following news articles.

Please provide a detailed analysis that:

1. Identifies the main themes and common topics across all articles
2. Highlights the most significant events, developments, or trends
3. Notes any contrasting or complementary viewpoints between sources
4. Provides context about the importance of these developments
5. Identifies potential implications or future trends

Structure your response with clear sections and bullet points where appropriate.

ARTICLES TO ANALYZE:
{context}

Please provide a comprehensive summary:"#;

const FOCUSED_TEMPLATE: &str = r#"You are a seasoned journalist writing a detailed but concise news brief.

**GOAL:** Produce a clear, factual summary that captures all major developments and provides essential context.
Be direct and professional, in the style of a wire-service feature.

**INSTRUCTIONS:**
- IGNORE all ads, filler, and commentary in the source.
- Focus ONLY on concrete facts, events, and official statements.
- Include relevant context or background to clarify significance.
- Expand on each topic: explain who, what, when, where, why, and how.
- Use strong verbs, active voice, and journalistic clarity.
- Do NOT include personal opinions, speculation, or rhetorical filler.
- For each topic write at least 8 sentences.

**STYLE:**
- Write like a professional journalist.
- Include specific names, locations, dates, and figures.
- Maintain factual tone; provide context where needed.
- Keep it informative, engaging, and tight.
- Do not say things like "here is your summary".

**OUTPUT FORMAT:**
*COMPELLING HEADLINE ALL IN CAPS*
*Strong lead paragraph*

*TOPIC NAME*: *Subheading*
*8-10 sentences with facts + context*

*TOPIC NAME*: *Subheading*
*8-10 sentences with facts + context*

...

ARTICLES:
{context}"#;

const KEY_POINTS_TEMPLATE: &str = r#"You are a text summarization specialist. Extract up to 5 key points from the news article below.

RULES:
1. Each point must be under 25 words
2. Use ONLY text from the article - no external knowledge
3. Each point must be supported by specific article content
4. If the article has no factual content, respond with: "Insufficient content for summary"
5. Format: Bullet points using dashes (-)

Article:
{article}"#;

pub fn brief_prompt(mode: SummaryMode, context: &str) -> String {
    let template = match mode {
        SummaryMode::Focused => FOCUSED_TEMPLATE,
        SummaryMode::Standard => STANDARD_TEMPLATE,
    };
    template.replace("{context}", context)
}

pub fn key_points_prompt(article: &str) -> String {
    KEY_POINTS_TEMPLATE.replace("{article}", article)
}
