//! Read-only problem catalog

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemDescriptor {
    /// Filled from the catalog key when omitted
    #[serde(default)]
    pub key: String,
    pub title: String,
    pub prompt: String,
    #[serde(default)]
    pub starter_code: String,
    #[serde(default)]
    pub tests: String,
}

/// Immutable set of problems, fixed at construction
#[derive(Debug, Clone, Default)]
pub struct ProblemCatalog {
    problems: BTreeMap<String, ProblemDescriptor>,
}

impl ProblemCatalog {
    pub fn new(problems: BTreeMap<String, ProblemDescriptor>) -> Self {
        let problems = problems
            .into_iter()
            .map(|(key, mut problem)| {
                if problem.key.is_empty() {
                    problem.key = key.clone();
                }
                (key, problem)
            })
            .collect();
        Self { problems }
    }

    /// Configured problems, or the built-in set when none are configured
    pub fn from_config(problems: &BTreeMap<String, ProblemDescriptor>) -> Self {
        if problems.is_empty() {
            Self::builtin()
        } else {
            Self::new(problems.clone())
        }
    }

    pub fn builtin() -> Self {
        let mut problems = BTreeMap::new();
        problems.insert(
            "two-sum".to_string(),
            ProblemDescriptor {
                key: "two-sum".to_string(),
                title: "Two Sum".to_string(),
                prompt: "Given nums and target, return indices of two numbers that add to target."
                    .to_string(),
                starter_code: "def two_sum(nums, target):\n    return [-1, -1]".to_string(),
                tests: "assert two_sum([2,7,11,15], 9) == [0,1]\nassert two_sum([3,2,4], 6) == [1,2]"
                    .to_string(),
            },
        );
        problems.insert(
            "fizzbuzz".to_string(),
            ProblemDescriptor {
                key: "fizzbuzz".to_string(),
                title: "FizzBuzz".to_string(),
                prompt: "Print numbers 1..n, replacing multiples of 3 with Fizz, 5 with Buzz."
                    .to_string(),
                starter_code: "def fizzbuzz(n):\n    for i in range(1, n+1):\n        print(i)"
                    .to_string(),
                tests: "fizzbuzz(15)".to_string(),
            },
        );
        Self { problems }
    }

    pub fn get(&self, key: &str) -> Option<&ProblemDescriptor> {
        self.problems.get(key)
    }

    pub fn list(&self) -> &BTreeMap<String, ProblemDescriptor> {
        &self.problems
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }
}
