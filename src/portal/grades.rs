//! Grades page parsing.
//!
//! The grades table is a server-rendered `GridView`. The first row is the
//! header; every following row with enough cells is one course:
//!
//!   [Code, Name, "Vize : 80 Final : -- Bütünleme : --", Letter, Status]
//!
//! The summary cell is free text, so each exam score is looked up
//! independently and missing scores keep the placeholder.

use html_scraper::{ElementRef, Html, Selector};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use super::markup::{self, columns};

static MIDTERM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Vize\s*:\s*(\S+)").unwrap());
static FINAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Final\s*:\s*(\S+)").unwrap());
static MAKEUP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Bütünleme\s*:\s*(\S+)").unwrap());

/// One row of the grades table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseGrade {
    pub code: String,
    pub name: String,
    pub letter_grade: String,
    pub midterm: String,
    pub r#final: String,
    pub makeup: String,
    pub status: String,
}

/// Courses shown for the selected term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeReport {
    pub courses: Vec<CourseGrade>,
    pub term_id: String,
}

/// Exam scores pulled out of a summary cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamScores {
    pub midterm: String,
    pub r#final: String,
    pub makeup: String,
}

impl Default for ExamScores {
    fn default() -> Self {
        Self {
            midterm: markup::SCORE_PLACEHOLDER.to_string(),
            r#final: markup::SCORE_PLACEHOLDER.to_string(),
            makeup: markup::SCORE_PLACEHOLDER.to_string(),
        }
    }
}

/// Parse a summary like `"Vize : 80 Final : -- Bütünleme : 45"`.
pub fn parse_exam_scores(summary: &str) -> ExamScores {
    let capture = |re: &Regex| {
        re.captures(summary)
            .map(|caps| caps[1].to_string())
            .unwrap_or_else(|| markup::SCORE_PLACEHOLDER.to_string())
    };

    ExamScores {
        midterm: capture(&MIDTERM_RE),
        r#final: capture(&FINAL_RE),
        makeup: capture(&MAKEUP_RE),
    }
}

/// Parse the whole grades page.
///
/// A page without the grades table yields an empty course list; terms with
/// no published grades render that way.
pub fn parse_grade_report(html: &Html, fallback_term: &str) -> GradeReport {
    let term_id = parse_selected_term(html).unwrap_or_else(|| fallback_term.to_string());

    let table_sel = Selector::parse(&format!("table#{}", markup::GRADES_TABLE_ID)).unwrap();
    let courses = match html.select(&table_sel).next() {
        Some(table) => parse_course_rows(table),
        None => Vec::new(),
    };

    GradeReport { courses, term_id }
}

fn parse_selected_term(html: &Html) -> Option<String> {
    let select_sel = Selector::parse(&format!("select#{}", markup::TERM_SELECT_ID)).unwrap();
    let option_sel = Selector::parse("option[selected]").unwrap();

    let select = html.select(&select_sel).next()?;
    let option = select.select(&option_sel).next()?;
    option
        .attr("value")
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_course_rows(table: ElementRef<'_>) -> Vec<CourseGrade> {
    let row_sel = Selector::parse("tr").unwrap();
    let cell_sel = Selector::parse("td, th").unwrap();

    table
        .select(&row_sel)
        .skip(1)
        .filter_map(|row| {
            let cells: Vec<String> = row.select(&cell_sel).map(cell_text).collect();

            if cells.len() < columns::MIN_CELLS {
                return None;
            }

            let scores = parse_exam_scores(&cells[columns::SUMMARY]);
            Some(CourseGrade {
                code: cells[columns::CODE].clone(),
                name: cells[columns::NAME].clone(),
                letter_grade: cells[columns::LETTER_GRADE].clone(),
                midterm: scores.midterm,
                r#final: scores.r#final,
                makeup: scores.makeup,
                status: cells[columns::STATUS].clone(),
            })
        })
        .collect()
}

/// Cell text with runs of whitespace (including `&nbsp;`) collapsed.
fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
