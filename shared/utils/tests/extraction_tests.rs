//! Sheetbom Integration Tests
//!
//! End-to-end extraction from job folders laid out like an engineering drive.

use std::fs;
use std::path::Path;

use sheetbom_utils::{BomConfig, BomDataCollector, JobFolder, LoadKind};

const HEADER: [&str; 12] = [
    "MARK",
    "QTY",
    "COMM",
    "Description",
    "",
    "",
    "LENGTH",
    "",
    "SPEC",
    "GRADE",
    "TEST",
    "SHIP WT (LBS)",
];

/// Writes a BOM sheet export: title in row 1, header in row 2, data from row 4,
/// everything starting at column B.
fn write_sheet(path: &Path, rows: &[&[&str]]) {
    let mut lines = vec!["Shipment BOM".to_string(), format!(",{}", HEADER.join(",")), ",".to_string()];
    lines.extend(rows.iter().map(|row| format!(",{}", row.join(","))));
    fs::write(path, lines.join("\n")).unwrap();
}

fn job_drive() -> (tempfile::TempDir, BomConfig) {
    let drive = tempfile::tempdir().unwrap();
    let bom = drive.path().join("1190123-02").join("BOM");
    fs::create_dir_all(&bom).unwrap();
    fs::create_dir_all(drive.path().join("1190123").join("BOM")).unwrap();

    write_sheet(
        &bom.join("Girders.csv"),
        &[
            &["G1", "2", "", "", "", "", "", "", "", "", "", ""],
            &["W1", "1", "Plate", "0.75", "", "12", "10", "6", "A709", "50", "T", "120"],
            &["A1B", "2", "Plate", "10 GA.", "", "4", "1", "0", "A606 Type 4", "", "", "5"],
            &["B1", "16", "HS Bolt", "", "", "", "", "", "", "", "", ""],
            &["G2", "3", "", "", "", "", "", "", "", "", "", ""],
            &["W1", "2", "Plate", "0.75", "", "12", "10", "6", "A709", "50", "T", "120"],
            &["A1B", "1", "Plate", "10 GA.", "", "4", "1", "0", "A606 Type 4", "", "", "5"],
        ],
    );
    write_sheet(
        &bom.join("Crossframes.csv"),
        &[
            &["X1", "4", "", "", "", "", "", "", "", "", "", ""],
            &["W1", "1", "Plate", "0.75", "", "12", "10", "6", "A709", "50", "T", "120"],
            &["L1", "2", "Angle", "0.5", "", "", "6", "0", "A709", "HPS50W", "X", "30"],
        ],
    );
    write_sheet(
        &bom.join("JobStandards.csv"),
        &[
            &["STD", "1", "", "", "", "", "", "", "", "", "", ""],
            &["C2D", "1", "Plate", "16 GA.", "", "3", "0", "9", "A36", "36", "", "2"],
        ],
    );
    write_sheet(&bom.join("Products.csv"), &[&["PRD", "1", "", "", "", "", "", "", "", "", "", ""]]);

    let mut config = BomConfig::default();
    config.engineering.eng_dir = drive.path().to_path_buf();

    (drive, config)
}

#[cfg(test)]
mod extraction_tests {
    use super::*;

    /// Full load of a shipment folder: roll-up, sub-components and skips.
    #[test]
    fn test_full_bom_load() {
        let (_drive, config) = job_drive();
        let mut collector = BomDataCollector::for_job("1190123", "2", &config).unwrap();
        assert!(collector.source().path().ends_with("1190123-02/BOM"));

        let report = collector.load_bom().unwrap();
        assert_eq!(report.kind, LoadKind::FullBom);
        assert_eq!(report.books_opened, 2);
        assert_eq!(report.sheets_extracted, 2);
        assert!(report.is_clean());

        let bom = collector.bom();
        assert!(bom.contains_key("G1"));
        assert!(bom.contains_key("G2"));
        assert!(bom.contains_key("X1"));
        assert!(!bom.contains_key("PRD"));

        // 2*1 + 3*2 on girders, 4*1 on crossframes
        let w1 = collector.get_part_data("W1");
        assert_eq!(w1.borrow().qty(), 12.0);
        assert_eq!(w1.borrow().length, Some(126.0));
        assert_eq!(w1.borrow().width, Some(12.0));
        assert_eq!(collector.material_grade(&w1.borrow()).as_deref(), Some("A709-50T2"));

        let l1 = collector.parts()["L1"].borrow().clone();
        assert_eq!(collector.material_grade(&l1).as_deref(), Some("A709-HPS50WX3"));

        assert!(!collector.parts().contains_key("B1"));
        assert!(!collector.parts().contains_key("A1B"));
        let g1_a1b = collector.parts()["G1-A1B"].borrow().clone();
        let g2_a1b = collector.parts()["G2-A1B"].borrow().clone();
        assert_eq!(g1_a1b.qty(), 4.0);
        assert_eq!(g2_a1b.qty(), 3.0);
        assert_eq!(g1_a1b.thickness, Some(0.125));
        assert_eq!(collector.material_grade(&g1_a1b).as_deref(), Some("A606-TYPE4"));
    }

    #[test]
    fn test_sub_component_lookup_reads_job_standards() {
        let (_drive, config) = job_drive();
        let mut collector = BomDataCollector::for_job("1190123", "02", &config).unwrap();

        let c2d = collector.get_part_data("C2D");
        assert_eq!(c2d.borrow().mark, "C2D");
        assert_eq!(c2d.borrow().thickness, Some(0.062));
        assert_eq!(c2d.borrow().length, Some(9.0));

        assert!(collector.has_job_standards());
        assert!(!collector.has_full_bom());
        assert!(collector.bom().is_empty());
    }

    #[test]
    fn test_unknown_mark_returns_null_part() {
        let (_drive, config) = job_drive();
        let mut collector = BomDataCollector::for_job("1190123", "2", &config).unwrap();

        let part = collector.get_part_data("Z404");
        assert!(part.borrow().is_null());
        assert_eq!(part.borrow().thickness, Some(0.0));
        assert!(collector.has_full_bom());
    }

    #[test]
    fn test_missing_shipment_falls_back_to_job_folder() {
        let (drive, config) = job_drive();
        let mut collector = BomDataCollector::for_job("1190123", "7", &config).unwrap();

        assert_eq!(collector.source().path(), drive.path().join("1190123").join("BOM"));
        let report = collector.load_bom().unwrap();
        assert_eq!(report.books_opened, 0);
        assert!(collector.bom().is_empty());
    }

    #[test]
    fn test_required_full_load_on_construction() {
        let (drive, mut config) = job_drive();
        config.collector.requires_full_load = true;

        let folder = JobFolder::new(drive.path().join("1190123-02").join("BOM"), &config);
        let collector = BomDataCollector::new("1190123", "2", &config, folder).unwrap();

        assert!(collector.has_full_bom());
        assert_eq!(collector.bom().len(), 3);
    }

    #[test]
    fn test_broken_book_is_reported() {
        let (drive, config) = job_drive();
        let bom = drive.path().join("1190123-02").join("BOM");
        fs::write(bom.join("Bearings.csv"), "title\n,MARK,QTY\n,\n,B1,1\n").unwrap();

        let mut collector = BomDataCollector::for_job("1190123", "2", &config).unwrap();
        let report = collector.load_bom().unwrap();

        assert_eq!(report.books_opened, 3);
        assert_eq!(report.sheets_extracted, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].book, "Bearings.csv");
        assert!(collector.bom().contains_key("G1"));
    }
}
