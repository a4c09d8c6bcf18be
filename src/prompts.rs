//! Embedded prompt templates for every pipeline stage.
//!
//! Role instructions are attached to an assistant once at creation
//! time; task prompts are composed per stage. Templates live in the
//! binary so a run is reproducible without any prompt files on disk.

/// Standing instructions for the analyst assistant.
pub const ANALYST_INSTRUCTIONS: &str = "\
You are a meticulous data analyst working in a newsroom. A tabular \
dataset is attached to this conversation and you can execute code \
against it. Ground every claim in the data: run the computation, check \
the result, and report concrete numbers. When asked to revise an \
analysis, keep what held up and rework only what the feedback targets.";

/// Standing instructions for the editor assistant.
pub const EDITOR_INSTRUCTIONS: &str = "\
You are a sharp news editor. A set of reference documents on editorial \
standards and newsworthiness is available to you through document \
search. Critique the material you are shown: question methodology, \
flag weak or overstated findings, and push for angles readers will \
care about. Be specific and constructive.";

/// Standing instructions for the reporter assistant.
pub const REPORTER_INSTRUCTIONS: &str = "\
You are a data journalist deciding what is worth a story. A tabular \
dataset is attached to this conversation. Judge analysis summaries for \
newsworthiness: surprising, concrete, relevant findings make the cut, \
routine or inconclusive ones do not. Answer in the exact format each \
task asks for.";

/// Step 1: brainstorm candidate analysis questions.
pub fn brainstorm_questions(n_questions: usize) -> String {
    format!(
        "## Task\n\n\
         Brainstorm {n_questions} questions that could be answered with the \
         dataset described above and that could each lead to a newsworthy \
         finding. Return them as a numbered list (\"1.\", \"2.\", ...), one \
         question per paragraph, separated by blank lines. Do not answer \
         the questions yet."
    )
}

/// Step 2: draft an analytical plan for one question.
pub fn analytical_plan(dataset_description: &str, question: &str) -> String {
    format!(
        "{dataset_description}\n\n\
         ## Task\n\n\
         Write a step-by-step analytical plan to answer the following \
         question with the dataset:\n\
         ```\n{question}\n```\n\
         List the variables involved, the transformations and checks you \
         will run, and how you will validate the result. Do not execute \
         anything yet."
    )
}

/// Step 2: ask the editor to critique a draft plan.
pub fn plan_critique(question: &str, plan: &str) -> String {
    format!(
        "Review the analytical plan below, written to answer this \
         question:\n\
         ```\n{question}\n```\n\n\
         Plan:\n\
         ```\n{plan}\n```\n\
         Point out methodological gaps, missing sanity checks, and ways \
         the plan could produce a misleading result."
    )
}

/// Step 2: fold editor critique back into the plan.
pub fn implement_plan_critique(critique: &str) -> String {
    format!(
        "An editor reviewed your analytical plan and responded:\n\
         ```\n{critique}\n```\n\
         Rewrite the plan, addressing this feedback. Return only the \
         revised plan."
    )
}

/// Step 3a: execute the analytical plan against the dataset.
pub fn execute_plan(plan: &str) -> String {
    format!(
        "## Task\n\n\
         Carry out the following analytical plan against the attached \
         dataset and report what you find:\n\
         ```\n{plan}\n```"
    )
}

/// Step 3: condense the latest execution into bullets.
pub const SUMMARIZE_FINDINGS: &str =
    "Summarize your approach and the key findings in bullet points.";

/// Step 3: condense a revised execution into bullets.
pub const SUMMARIZE_REVISED_FINDINGS: &str =
    "Summarize your revised approach and the key findings in bullet points";

/// Step 3b: ask the reporter to judge an execution summary.
pub fn execution_feedback(question: &str, summary: &str) -> String {
    format!(
        "An analyst investigated this question:\n\
         ```\n{question}\n```\n\
         and summarized the findings as:\n\
         ```\n{summary}\n```\n\
         Decide how to proceed and answer with exactly one of:\n\
         - \"Option 1\" if the findings are newsworthy and complete enough \
         to publish as-is;\n\
         - \"Option 2\" if the analysis is promising but needs another \
         pass - then describe precisely what to change or dig into;\n\
         - \"Option 3\" if this question will not produce a newsworthy \
         finding and should be dropped."
    )
}

/// Step 3c: fold reporter feedback into the next execution pass.
pub fn implement_reporter_feedback(feedback: &str) -> String {
    format!(
        "A reporter reviewed your summary and responded:\n\
         ```\n{feedback}\n```\n\
         Revise the analysis accordingly: rerun what needs rerunning \
         against the dataset and report the updated findings."
    )
}

/// Step 3d: ask the editor to critique the condensed insights.
pub fn insights_critique(question: &str, bullets: &str) -> String {
    format!(
        "These bullet points summarize an analysis of the question:\n\
         ```\n{question}\n```\n\n\
         ```\n{bullets}\n```\n\
         Critique them for newsworthiness, clarity, and rigor. What \
         should be strengthened, cut, or double-checked before \
         publication?"
    )
}

/// Step 3e: fold editor critique into a final revision.
pub fn implement_insights_critique(critique: &str) -> String {
    format!(
        "An editor reviewed your summarized insights and responded:\n\
         ```\n{critique}\n```\n\
         Revise the analysis accordingly, rerunning computations against \
         the dataset where needed, and report the updated findings."
    )
}

/// Step 3f: condense all accumulated summaries for one question.
pub fn summarize_insights(question: &str, summaries: &str) -> String {
    format!(
        "## Task\n\n\
         The question under investigation was:\n\
         ```\n{question}\n```\n\
         The analysis produced these summaries:\n\
         ```\n{summaries}\n```\n\
         Condense them into a single bullet list of the newsworthy \
         insights, leading with the strongest finding. Include the \
         concrete numbers that support each bullet."
    )
}

/// Step 4: compile the final tipsheet from all per-question bullets.
pub fn create_tipsheet(n_bullets: usize, analyses: &str) -> String {
    format!(
        "## Task\n\n\
         Below are the summarized analyses produced for a dataset, one \
         block per question investigated:\n\n\
         {analyses}\n\
         Compile a tipsheet of the {n_bullets} most newsworthy findings \
         across all analyses, ranked from most to least newsworthy. One \
         bullet per finding, each with its supporting numbers and the \
         analysis it came from."
    )
}
