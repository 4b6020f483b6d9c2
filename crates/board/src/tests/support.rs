use std::fmt;

use crate::item::{BoardItem, StatusKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Lane {
    A,
    B,
    C,
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Lane::A => "A",
            Lane::B => "B",
            Lane::C => "C",
        };
        f.write_str(name)
    }
}

impl StatusKey for Lane {
    const ALL: &'static [Self] = &[Lane::A, Lane::B, Lane::C];
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Card {
    pub(crate) id: String,
    pub(crate) status: Lane,
    pub(crate) title: String,
}

impl BoardItem for Card {
    type Id = String;
    type Status = Lane;

    fn id(&self) -> &String {
        &self.id
    }

    fn status(&self) -> Lane {
        self.status
    }

    fn set_status(&mut self, status: Lane) {
        self.status = status;
    }
}

pub(crate) fn card(id: &str, status: Lane) -> Card {
    Card {
        id: id.to_string(),
        status,
        title: format!("card {id}"),
    }
}

pub(crate) fn ids(items: &[Card]) -> Vec<&str> {
    items.iter().map(|item| item.id.as_str()).collect()
}
