//! Downloadable plain-text rendering of a placement.

use crate::model::{ClassificationResult, Locale};

struct Labels {
    title: &'static str,
    name: &'static str,
    nis: &'static str,
    school: &'static str,
    category: &'static str,
    class: &'static str,
}

fn labels(locale: Locale) -> Labels {
    match locale {
        Locale::En => Labels {
            title: "Class Placement Result",
            name: "Name",
            nis: "NIS",
            school: "School",
            category: "Performance Category",
            class: "Recommended Class",
        },
        Locale::Id => Labels {
            title: "Hasil Pembagian Kelas",
            name: "Nama",
            nis: "NIS",
            school: "Asal Sekolah",
            category: "Kategori Prestasi",
            class: "Kelas Direkomendasikan",
        },
    }
}

/// Title, a blank line, then the five labeled fields.
pub fn render_document(result: &ClassificationResult, locale: Locale) -> String {
    let l = labels(locale);
    format!(
        "{}\n\n{}: {}\n{}: {}\n{}: {}\n{}: {}\n{}: {}\n",
        l.title,
        l.name,
        result.name,
        l.nis,
        result.nis,
        l.school,
        result.school,
        l.category,
        result.category.label(locale),
        l.class,
        result.class.label(locale),
    )
}

pub fn suggested_filename(result: &ClassificationResult) -> String {
    let nis: String = result
        .nis
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    format!("placement_{}.txt", nis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, ClassLabel, Provenance, Query, Scores};

    fn result() -> ClassificationResult {
        let query = Query::new("2024/017", " budi ", "SMP Negeri 2", Scores::uniform(90.0));
        ClassificationResult::new(&query, Category::High, ClassLabel::A, Provenance::Model)
    }

    #[test]
    fn test_document_has_title_and_five_lines() {
        let doc = render_document(&result(), Locale::En);
        let lines: Vec<&str> = doc.lines().collect();
        assert_eq!(lines[0], "Class Placement Result");
        assert_eq!(lines[1], "");
        assert_eq!(
            &lines[2..],
            &[
                "Name: BUDI",
                "NIS: 2024/017",
                "School: SMP Negeri 2",
                "Performance Category: High",
                "Recommended Class: Class A",
            ]
        );
    }

    #[test]
    fn test_indonesian_document() {
        let doc = render_document(&result(), Locale::Id);
        assert!(doc.starts_with("Hasil Pembagian Kelas\n"));
        assert!(doc.contains("Kategori Prestasi: Tinggi\n"));
        assert!(doc.contains("Kelas Direkomendasikan: Kelas A\n"));
    }

    #[test]
    fn test_filename_is_sanitized() {
        assert_eq!(suggested_filename(&result()), "placement_2024_017.txt");
    }
}
