//! Prompt templates for answers, summaries, grounding checks and quiz items

use crate::types::{Difficulty, QuestionType, SummaryKind};

/// Prompt builder for every generation call the assistant makes
pub struct PromptBuilder;

impl PromptBuilder {
    /// Cited question answering over labeled context
    pub fn qa(question: &str, labeled_context: &str) -> String {
        format!(
            r#"From the given context, answer the question concisely.
Use inline citation markers like [1], [2], etc., to indicate which context passages support your answer.
**Important: Use ONLY the provided citation numbers shown in the context.** Do NOT invent or change citation numbers.
If no exact answer exists, reply 'No answer'.

Context with labels:
{context}

Question:
{question}

Answer (with [n] markers):"#,
            context = labeled_context,
            question = question,
        )
    }

    /// Exam-coach summary over retrieved context
    pub fn summary(request: &str, context: &str, kind: SummaryKind) -> String {
        format!(
            r#"You are an exam coach.
Write an exam-prep summary based ONLY on the context below.

Format:
1) Core concepts (bullets, concise)
2) Common traps and misconceptions
3) Summary by major concept area (e.g. definition, principle, application, pros and cons)
4) Three-line final summary
{focus}
Request (topic): {request}
Context:
{context}

Rules:
- Do not guess anything that is not in the context.
- Keep it concise so the learner can memorise it right away."#,
            focus = Self::summary_focus(kind),
            request = request,
            context = context,
        )
    }

    fn summary_focus(kind: SummaryKind) -> &'static str {
        match kind {
            SummaryKind::Overall => "",
            SummaryKind::Traps => "\nGive section 2 the most detail.\n",
            SummaryKind::ConceptAreas => "\nGive section 3 the most detail.\n",
            SummaryKind::ThreeLines => "\nKeep sections 1-3 short; section 4 matters most.\n",
        }
    }

    /// Revision request embedding the previous candidate and the judge's objection
    pub fn summary_fix(previous: &str, reason: &str) -> String {
        format!(
            "{}\n\nProblem with the summary above: {}\n→ Revise the summary to address the problem.",
            previous, reason
        )
    }

    /// Faithfulness judge; expects `{"ok": bool, "reason": string}`
    pub fn judge(context: &str, summary: &str) -> String {
        format!(
            r#"You are a judge checking whether a summary is faithful to its context.
Decide whether the summary below is factually consistent with the context.

Context:
{context}

Summary:
{summary}

Answer ONLY in JSON: {{ "ok": true/false, "reason": "<short reason>" }}"#,
            context = context,
            summary = summary,
        )
    }

    /// One quiz item drawn only from `context`
    pub fn quiz_item(
        id: u32,
        question_type: QuestionType,
        difficulty: Difficulty,
        context: &str,
    ) -> String {
        format!(
            r#"You are a quiz writer for students. Write exactly ONE question whose answer is found only in the CONTEXT below.
- Set "type" to "{qtype}".
- Set "difficulty" to "{difficulty}".
- For "multiple_choice":
  * give exactly 4 "options",
  * exactly one option is correct,
  * "answer" is the text of the correct option, copied verbatim.
- For "short_answer": "answer" is a concise keyword answer.
- For "essay": "answer" lists the grading key points concisely.
- Never add facts, numbers or definitions that are not in the CONTEXT.

Return a single JSON object with the fields "type", "difficulty", "question", "options", "answer", "explanation". This is question {id}.

CONTEXT:
{context}"#,
            qtype = question_type.as_str(),
            difficulty = difficulty.as_str(),
            id = id,
            context = context,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qa_prompt_carries_context_and_sentinel() {
        let prompt = PromptBuilder::qa("What is ATP?", "[1] ATP stores energy.");
        assert!(prompt.contains("[1] ATP stores energy."));
        assert!(prompt.contains("Question:\nWhat is ATP?"));
        assert!(prompt.contains("'No answer'"));
        assert!(prompt.ends_with("Answer (with [n] markers):"));
    }

    #[test]
    fn test_fix_prompt_shape() {
        let prompt = PromptBuilder::summary_fix("old summary", "mentions a date not in context");
        assert!(prompt.starts_with("old summary\n\n"));
        assert!(prompt.contains("Problem with the summary above: mentions a date not in context"));
    }

    #[test]
    fn test_judge_prompt_asks_for_json() {
        let prompt = PromptBuilder::judge("ctx", "sum");
        assert!(prompt.contains(r#"{ "ok": true/false"#));
    }

    #[test]
    fn test_quiz_prompt_uses_canonical_names() {
        let prompt = PromptBuilder::quiz_item(3, QuestionType::Essay, Difficulty::Hard, "ctx");
        assert!(prompt.contains(r#""type" to "essay""#));
        assert!(prompt.contains(r#""difficulty" to "hard""#));
        assert!(prompt.contains("question 3"));
    }
}
