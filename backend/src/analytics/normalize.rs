use crate::models::{Answer, Response};
use std::collections::HashMap;

pub type AnswerMap<'a> = HashMap<&'a str, HashMap<&'a str, &'a Answer>>;

pub fn answer_map(response: &Response) -> AnswerMap<'_> {
    let mut map = AnswerMap::new();
    for section in &response.section_answers {
        let answers: HashMap<&str, &Answer> = section
            .answers
            .iter()
            .map(|a| (a.question.as_str(), a))
            .collect();
        map.insert(section.section_name.as_str(), answers);
    }
    map
}

pub fn lookup<'a>(map: &AnswerMap<'a>, section: &str, question_id: &str) -> Option<&'a Answer> {
    map.get(section).and_then(|answers| answers.get(question_id)).copied()
}
