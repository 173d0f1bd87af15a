//! Vote tallies resolved by the oracle and consumed by the escrow.
//!
//! Text form: questions separated by `|`, votes by `,`, each vote `count:weight`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::plutus::{expect_fields, expect_list, expect_uint};
use crate::{DatumError, PlutusData};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub count: u64,
    pub weight: u64,
}

impl Vote {
    pub fn new(count: u64, weight: u64) -> Self {
        Self { count, weight }
    }
}

/// Per-question vote lists.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally(Vec<Vec<Vote>>);

impl VoteTally {
    pub fn new(questions: Vec<Vec<Vote>>) -> Self {
        Self(questions)
    }

    pub fn questions(&self) -> &[Vec<Vote>] {
        &self.0
    }

    pub fn question(&self, index: usize) -> Option<&[Vote]> {
        self.0.get(index).map(Vec::as_slice)
    }

    /// `[[ [count, weight], ... ], ...]`
    pub fn to_plutus(&self) -> PlutusData {
        PlutusData::list(
            self.0
                .iter()
                .map(|votes| {
                    PlutusData::list(
                        votes
                            .iter()
                            .map(|v| {
                                PlutusData::list(vec![
                                    PlutusData::int(v.count),
                                    PlutusData::int(v.weight),
                                ])
                            })
                            .collect(),
                    )
                })
                .collect(),
        )
    }

    pub fn from_plutus(data: &PlutusData) -> Result<Self, DatumError> {
        let questions = expect_list(data, "vote tally")?
            .iter()
            .map(|votes| {
                expect_list(votes, "votes")?
                    .iter()
                    .map(|vote| {
                        let pair = expect_fields(expect_list(vote, "vote")?, "vote", 2)?;
                        Ok(Vote::new(
                            expect_uint(&pair[0], "vote count")?,
                            expect_uint(&pair[1], "vote weight")?,
                        ))
                    })
                    .collect::<Result<Vec<_>, DatumError>>()
            })
            .collect::<Result<Vec<_>, DatumError>>()?;
        Ok(Self(questions))
    }
}

fn parse_amount(token: &str, text: &str) -> Result<u64, DatumError> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DatumError::InvalidVotes(format!(
            "{token:?} is not a non-negative integer in {text:?}"
        )));
    }
    token
        .parse()
        .map_err(|e| DatumError::InvalidVotes(format!("{token:?}: {e}")))
}

impl FromStr for VoteTally {
    type Err = DatumError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let questions = text
            .split('|')
            .map(|group| {
                group
                    .split(',')
                    .map(|vote| {
                        let (count, weight) = vote.split_once(':').ok_or_else(|| {
                            DatumError::InvalidVotes(format!("missing ':' in {vote:?}"))
                        })?;
                        Ok(Vote::new(
                            parse_amount(count, text)?,
                            parse_amount(weight, text)?,
                        ))
                    })
                    .collect::<Result<Vec<_>, DatumError>>()
            })
            .collect::<Result<Vec<_>, DatumError>>()?;
        Ok(Self(questions))
    }
}

impl fmt::Display for VoteTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, votes) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("|")?;
            }
            for (j, vote) in votes.iter().enumerate() {
                if j > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{}:{}", vote.count, vote.weight)?;
            }
        }
        Ok(())
    }
}
