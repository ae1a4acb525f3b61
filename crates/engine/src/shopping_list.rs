//! Aggregated shopping list and its printable layout.
//!
//! Lines are laid out with the coordinates of a classic A4 canvas: the title
//! sits at the top of the first page only, body lines go down 20 units at a
//! time and a new page starts once the next baseline would reach the bottom
//! margin.

use crate::{
    ResultEngine,
    pdf::{self, PlacedText},
};

pub(crate) const TITLE: &str = "Shopping list";
const TITLE_X: i32 = 150;
const TITLE_SIZE: u8 = 24;
const BODY_X: i32 = 50;
const BODY_SIZE: u8 = 14;
const FIRST_LINE_Y: i32 = 750;
const PAGE_TOP_Y: i32 = 800;
const LINE_STEP: i32 = 20;
const BOTTOM_MARGIN: i32 = 50;

/// Total amount of one (name, unit) pair across the cart.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShoppingListLine {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShoppingList {
    lines: Vec<ShoppingListLine>,
}

impl ShoppingList {
    pub fn new(lines: Vec<ShoppingListLine>) -> Self {
        Self { lines }
    }

    pub fn lines(&self) -> &[ShoppingListLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// `"{index}. {name} - {amount} {unit}"`, numbered from 1.
    pub fn numbered_lines(&self) -> impl Iterator<Item = String> + '_ {
        self.lines.iter().enumerate().map(|(index, line)| {
            format!(
                "{}. {} - {} {}",
                index + 1,
                line.name,
                line.amount,
                line.measurement_unit
            )
        })
    }

    /// Split the list into pages of positioned text.
    pub(crate) fn layout(&self) -> Vec<Vec<PlacedText>> {
        let mut pages = vec![vec![PlacedText {
            x: TITLE_X,
            y: PAGE_TOP_Y,
            size: TITLE_SIZE,
            text: TITLE.to_string(),
        }]];
        let mut y = FIRST_LINE_Y;

        for text in self.numbered_lines() {
            if y <= BOTTOM_MARGIN {
                pages.push(Vec::new());
                y = PAGE_TOP_Y;
            }
            if let Some(page) = pages.last_mut() {
                page.push(PlacedText {
                    x: BODY_X,
                    y,
                    size: BODY_SIZE,
                    text,
                });
            }
            y -= LINE_STEP;
        }

        pages
    }

    /// Render the list as a PDF document.
    pub fn to_pdf(&self) -> ResultEngine<Vec<u8>> {
        pdf::render(TITLE, &self.layout())
    }
}
