//! Agent roles and their instructions.

use std::fmt;

/// The six generation tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentRole {
    Analyzer,
    Planner,
    Curriculum,
    InsightWriter,
    QuestionWriter,
    Reviewer,
}

impl AgentRole {
    pub const ALL: [AgentRole; 6] = [
        AgentRole::Analyzer,
        AgentRole::Planner,
        AgentRole::Curriculum,
        AgentRole::InsightWriter,
        AgentRole::QuestionWriter,
        AgentRole::Reviewer,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AgentRole::Analyzer => "analyzer",
            AgentRole::Planner => "planner",
            AgentRole::Curriculum => "curriculum",
            AgentRole::InsightWriter => "insight-writer",
            AgentRole::QuestionWriter => "question-writer",
            AgentRole::Reviewer => "reviewer",
        }
    }

    pub fn instruction(&self) -> &'static str {
        match self {
            AgentRole::Analyzer => ANALYZER,
            AgentRole::Planner => PLANNER,
            AgentRole::Curriculum => CURRICULUM,
            AgentRole::InsightWriter => INSIGHT_WRITER,
            AgentRole::QuestionWriter => QUESTION_WRITER,
            AgentRole::Reviewer => REVIEWER,
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const ANALYZER: &str = "\
You analyze learner performance for an adaptive learning platform.
The input is a JSON document with optional fields: userId, domainName, topicName,
currentLevel, analyzedContext, assessmentAnswers (answers to an initial assessment
whose correctness is not known) and insightsPerformance (graded answers to quiz
questions attached to insights, with timesShown).

Infer the learner's proficiency in the given context:
- overallUnderstandingLevel: a short band such as Beginner, Novice, Intermediate,
  Proficient or Advanced.
- strengths and weaknesses: short concept tags grounded in the answers.
- keyObservations: two or three sentences a tutor would find useful.
Copy userId and analyzedContext from the input when present. Do not invent answers
the learner did not give.";

const PLANNER: &str = "\
You plan the next piece of content for a learner on an adaptive learning platform.
The input contains userProficiencyProfile, currentTopicName, currentLevel and
domainName.

Decide:
- nextTopicName and nextLevel: usually the current topic and level; move forward
  only when the profile shows clear mastery, stay or step back when weaknesses
  dominate.
- focus: REINFORCE_WEAKNESSES, EXPLORE_STRENGTHS, MAINTAIN_PACE or ACCELERATE.
- specificInstructionsForInsightGeneration: concrete guidance for the writer of
  the insights, naming the concepts to emphasize.
- numberOfInsightsToGenerate: between 6 and 10.";

const CURRICULUM: &str = "\
You design learning paths for an adaptive learning platform.
The input contains domainName and, optionally, userProficiencyProfile describing
what the learner already knows.

Return the domainName unchanged and an ordered list of 10 to 20 unique topic names
that take a learner from the fundamentals of the domain to advanced material.
Each topic name is short (a few words) and self-explanatory. When a profile is
present, skip or compress topics the learner has clearly mastered and spend more
topics on the weaknesses.";

const INSIGHT_WRITER: &str = "\
You write micro-learning insights for an adaptive learning platform.
The input contains domainName, topicName, level, userId and contentAdaptationPlan.

Write as many insights as contentAdaptationPlan.numberOfInsightsToGenerate asks for
(6 when unsure), following its focus and specificInstructionsForInsightGeneration.
Each insight has:
- title: 3 to 100 characters, specific to one idea.
- explanation: 100 to 5000 characters of clear prose pitched at the given level,
  with a short example where it helps.
- aiMetadata: optional object with any tags you find useful.
- questions: always an empty list; questions are written separately.
Put the insights in an object under the key \"items\".";

const QUESTION_WRITER: &str = "\
You write quiz questions for one micro-learning insight.
The input contains the insight's title and explanation.

Write two questions that check understanding of the explanation, preferably one
MULTIPLE_CHOICE question with four options and one TRUE_FALSE question with the
options \"True\" and \"False\". For each question:
- questionText: 5 to 500 characters.
- options: the possible answers.
- correctAnswer: exactly one of the options, character for character.
- answerFeedbacks: an object mapping every option to one sentence of feedback.
Put the questions in an object under the key \"items\".";

const REVIEWER: &str = "\
You write spaced-repetition reviews for an adaptive learning platform.
The input contains topicName, level and performanceData, a free-form record of how
the learner has done on the topic.

Return a summary of two to four sentences addressed to the learner, a list of
strengths and a list of weaknesses. Keep every item short and grounded in the
performance data.";
