//! BOM Data Collector
//!
//! Builds the assembly/part graph of one job shipment from its BOM sheets.
//!
//! Sheets list assemblies and parts as one flat sequence. A run of assembly
//! rows opens a group, and every part row that follows belongs to each
//! assembly in that group until the next assembly row closes it.

use indexmap::IndexMap;
use regex::Regex;
use std::cell::RefCell;
use std::rc::Rc;

use sheetbom_models::{CellValue, UnitSystem};

use super::entity::{Assembly, AssemblyRef, Part, PartRef};
use super::report::{LoadKind, LoadReport};
use super::source::{JobFolder, SheetData, Workbook, WorkbookSource};
use crate::config::{BomConfig, CollectorOptions, ExtractionTables};
use crate::error::{BomError, BomResult};
use crate::header::{HeaderParser, RowView};
use crate::validation::validate_config;

/// A header prepared for BOM extraction.
#[derive(Debug, Clone)]
pub struct SheetHeader {
    pub parser: Rc<HeaderParser>,
    pub units: Option<UnitSystem>,
}

/// A row accepted by [`BomDataCollector::process_line`].
#[derive(Debug, Clone)]
pub enum BomLine {
    Assembly(AssemblyRef),
    Part(PartRef),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum LineKind {
    #[default]
    Assembly,
    Part,
}

/// Assemblies waiting for their parts, and the kind of the last accepted line.
#[derive(Debug, Default)]
struct AssemblyGroup {
    pending: Vec<AssemblyRef>,
    previous: LineKind,
}

/// Collects parts and assemblies for one job shipment.
///
/// Parts are cached by mark across every sheet and book the collector reads.
pub struct BomDataCollector<S: WorkbookSource> {
    job: String,
    shipment: String,
    source: S,
    tables: ExtractionTables,
    options: CollectorOptions,
    sub_component: Regex,
    parts: IndexMap<String, PartRef>,
    bom: IndexMap<String, AssemblyRef>,
    null_part: PartRef,
    fetched_job_standards: bool,
    fetched_full_bom: bool,
}

impl BomDataCollector<JobFolder> {
    /// Collector reading the job's BOM folder under the engineering directory.
    pub fn for_job(job: &str, shipment: &str, config: &BomConfig) -> BomResult<Self> {
        let source = JobFolder::locate(config, job, shipment);
        Self::new(job, shipment, config, source)
    }
}

impl<S: WorkbookSource> BomDataCollector<S> {
    pub fn new(job: &str, shipment: &str, config: &BomConfig, source: S) -> BomResult<Self> {
        validate_config(config)?;

        let sub_component = Regex::new(&config.tables.sub_component_pattern).map_err(|e| {
            BomError::configuration(format!("invalid sub-component pattern: {}", e))
        })?;

        let mut collector = Self {
            job: job.to_string(),
            shipment: shipment.to_string(),
            source,
            tables: config.tables.clone(),
            options: config.collector.clone(),
            sub_component,
            parts: IndexMap::new(),
            bom: IndexMap::new(),
            null_part: Rc::new(RefCell::new(Part::null_part())),
            fetched_job_standards: false,
            fetched_full_bom: false,
        };

        if collector.options.requires_full_load {
            collector.load_bom()?;
        }

        Ok(collector)
    }

    pub fn job(&self) -> &str {
        &self.job
    }

    pub fn shipment(&self) -> &str {
        &self.shipment
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Every cached part, by mark. Sub-components appear under `{assembly}-{mark}`.
    pub fn parts(&self) -> &IndexMap<String, PartRef> {
        &self.parts
    }

    /// Closed assemblies, by mark.
    pub fn bom(&self) -> &IndexMap<String, AssemblyRef> {
        &self.bom
    }

    pub fn null_part(&self) -> PartRef {
        Rc::clone(&self.null_part)
    }

    pub fn has_full_bom(&self) -> bool {
        self.fetched_full_bom
    }

    pub fn has_job_standards(&self) -> bool {
        self.fetched_job_standards
    }

    /// Marks shaped like `A12B`: a component of a larger part.
    pub fn is_sub_component(&self, mark: &str) -> bool {
        self.sub_component
            .find(mark)
            .map_or(false, |found| found.start() == 0)
    }

    /// Material grade of `part` under this collector's CVN policy.
    pub fn material_grade(&self, part: &Part) -> Option<String> {
        part.material_grade(self.options.force_cvn)
    }

    /// Looks up a part, loading the documents that should hold it on first miss.
    ///
    /// Sub-component marks come from the job standards book, everything else
    /// from the full BOM. Unknown marks return the null part.
    pub fn get_part_data(&mut self, mark: &str) -> PartRef {
        if !self.parts.contains_key(mark) {
            let load = if self.is_sub_component(mark) {
                (!self.fetched_job_standards).then(|| self.load_job_standards())
            } else {
                (!self.fetched_full_bom).then(|| self.load_bom())
            };

            if let Some(Err(error)) = load {
                tracing::warn!(mark, error = %error, "BOM load failed during part lookup");
            }
        }

        match self.parts.get(mark) {
            Some(part) => Rc::clone(part),
            None => {
                tracing::debug!(mark, "Part not found, using null part");
                self.null_part()
            }
        }
    }

    /// Extracts every BOM sheet of every BOM book.
    ///
    /// Runs once per collector; later calls return a cached report and read nothing.
    pub fn load_bom(&mut self) -> BomResult<LoadReport> {
        if self.fetched_full_bom {
            tracing::debug!(job = %self.job, shipment = %self.shipment, "Full BOM already loaded");
            return Ok(LoadReport::cached(LoadKind::FullBom));
        }

        let mut report = LoadReport::new(LoadKind::FullBom);

        for name in self.source.bom_book_names()? {
            match self.source.open_book(&name) {
                Ok(mut book) => {
                    report.books_opened += 1;
                    self.extract_book(&mut book, false, &mut report);
                }
                Err(error) => {
                    tracing::error!(workbook = %name, error = %error, "Failed to open workbook");
                    report.record_failure(&name, None, error);
                }
            }
        }

        self.fetched_full_bom = true;
        report.finish();
        log_report(&self.job, &self.shipment, &report);

        Ok(report)
    }

    /// Caches the parts of the job standards book without building assemblies.
    pub fn load_job_standards(&mut self) -> BomResult<LoadReport> {
        if self.fetched_job_standards {
            tracing::debug!(job = %self.job, shipment = %self.shipment, "Job standards already loaded");
            return Ok(LoadReport::cached(LoadKind::JobStandards));
        }

        let mut report = LoadReport::new(LoadKind::JobStandards);

        let mut book = self.source.job_standards_book()?;
        report.books_opened += 1;
        self.extract_book(&mut book, true, &mut report);

        self.fetched_job_standards = true;
        report.finish();
        log_report(&self.job, &self.shipment, &report);

        Ok(report)
    }

    fn extract_book(&mut self, book: &mut S::Book, skip_bom_processing: bool, report: &mut LoadReport) {
        let book_name = book.name().to_string();

        for sheet_name in book.sheet_names() {
            if self.tables.is_skipped_sheet(&sheet_name) {
                report.sheets_skipped += 1;
                continue;
            }

            let result = book
                .read_sheet(&sheet_name)
                .and_then(|sheet| self.extract_sheet_data(sheet, skip_bom_processing));

            match result {
                Ok(()) => {
                    tracing::debug!(workbook = %book_name, sheet = %sheet_name, "Sheet extracted");
                    report.sheets_extracted += 1;
                }
                Err(error) => {
                    tracing::error!(
                        workbook = %book_name,
                        sheet = %sheet_name,
                        error = %error,
                        "Error extracting sheet"
                    );
                    report.record_failure(&book_name, Some(&sheet_name), error);
                }
            }
        }
    }

    /// Runs one sheet through the collector.
    ///
    /// With `skip_bom_processing` rows only populate the part cache.
    /// Assemblies still open when the sheet ends are closed with it.
    pub fn extract_sheet_data(&mut self, sheet: SheetData, skip_bom_processing: bool) -> BomResult<()> {
        let header = self.process_header(HeaderParser::from_rows(sheet.header))?;

        let mut group = AssemblyGroup::default();

        for (offset, row) in sheet.rows.into_iter().enumerate() {
            let view = header.parser.parse_row(row);
            let row_qty = view.clone();

            let line = self
                .process_line(view, header.units)
                .map_err(|e| BomError::sheet(&sheet.name, format!("data row {}: {}", offset + 1, e)))?;

            if skip_bom_processing {
                continue;
            }

            if let Some(line) = line {
                let qty = match line {
                    BomLine::Part(_) => row_qty.get_f64("qty")?.unwrap_or(0.0),
                    BomLine::Assembly(_) => 0.0,
                };
                self.accept_line(&mut group, line, qty);
            }
        }

        self.close_assemblies(&mut group.pending);
        Ok(())
    }

    /// Feeds one accepted line into the open assembly group.
    ///
    /// An assembly following a part closes the group before opening a new one.
    fn accept_line(&mut self, group: &mut AssemblyGroup, line: BomLine, qty: f64) {
        match line {
            BomLine::Assembly(assembly) => {
                if group.previous == LineKind::Part {
                    self.close_assemblies(&mut group.pending);
                }
                group.previous = LineKind::Assembly;
                group.pending.push(assembly);
            }
            BomLine::Part(part) => {
                self.attach_part(&part, &group.pending, qty);
                group.previous = LineKind::Part;
            }
        }
    }

    /// Registers field aliases and the fixed-offset columns, and reads the unit system.
    pub fn process_header(&self, mut parser: HeaderParser) -> BomResult<SheetHeader> {
        parser.add_header_aliases(self.tables.header_aliases.iter());

        let thk = parser.get_index("thk")?;
        parser.add_column_index("Width", thk + 2);

        let length = parser.get_index("length")?;
        parser.add_column_index("Length Inches", length + 1);

        let units = match parser.column_label("weight") {
            Ok(label) => UnitSystem::from_weight_label(&label),
            Err(error) if error.is_header_miss() => None,
            Err(error) => return Err(error),
        };

        Ok(SheetHeader {
            parser: Rc::new(parser),
            units,
        })
    }

    /// Classifies a row and returns its assembly or its cached part.
    ///
    /// Rows without a mark or with a skipped type yield nothing. Rows with a
    /// blank type are assemblies; the rest are parts.
    pub fn process_line(&mut self, mut line: RowView, units: Option<UnitSystem>) -> BomResult<Option<BomLine>> {
        let Some(mark) = line.get_text("mark")? else {
            return Ok(None);
        };

        let part_type = line.get_text("type")?;
        let Some(part_type) = part_type else {
            return Ok(Some(BomLine::Assembly(Rc::new(Assembly::from_row(line)))));
        };
        if self.tables.is_skipped_type(&part_type) {
            return Ok(None);
        }

        if let Some(part) = self.parts.get(&mark) {
            return Ok(Some(BomLine::Part(Rc::clone(part))));
        }

        let inches = match units {
            Some(UnitSystem::Imperial) => line.get_f64("length_inches")?,
            _ => None,
        };
        let length = UnitSystem::compose_length(units, line.get_f64("length")?, inches);

        let mut legacy = None;
        for field in ["spec", "grade"] {
            if let Some(text) = line.try_get_text(field)? {
                legacy = self.tables.grade_for(&text).cloned();
                if legacy.is_some() {
                    break;
                }
            }
        }
        if let Some(triple) = legacy {
            line.set("spec", triple.spec);
            line.set("grade", triple.grade);
            line.set("test", triple.test);
        }

        let part = Part::from_row(
            line,
            &self.tables,
            vec![("len", CellValue::from(length)), ("length", CellValue::from(length))],
        )?;
        let part = Rc::new(RefCell::new(part));
        self.parts.insert(mark, Rc::clone(&part));

        Ok(Some(BomLine::Part(part)))
    }

    /// Attaches a part to every open assembly.
    ///
    /// Sub-components are kept per parent as `{assembly}-{mark}`; their bare
    /// mark is dropped from the cache since it recurs under unrelated parents.
    fn attach_part(&mut self, part: &PartRef, pending: &[AssemblyRef], qty: f64) {
        let mark = part.borrow().mark.clone();

        if !self.is_sub_component(&mark) {
            for assembly in pending {
                assembly.add_part(part, qty);
            }
            return;
        }

        for assembly in pending {
            let key = format!("{}-{}", assembly.mark, mark);
            let component = self
                .parts
                .entry(key)
                .or_insert_with(|| Rc::new(RefCell::new(part.borrow().detached())))
                .clone();
            assembly.add_part(&component, qty);
        }
        self.parts.shift_remove(&mark);
    }

    fn close_assemblies(&mut self, pending: &mut Vec<AssemblyRef>) {
        for assembly in pending.drain(..) {
            self.bom.insert(assembly.mark.clone(), assembly);
        }
    }
}

fn log_report(job: &str, shipment: &str, report: &LoadReport) {
    tracing::info!(
        job,
        shipment,
        kind = ?report.kind,
        books = report.books_opened,
        sheets = report.sheets_extracted,
        skipped = report.sheets_skipped,
        failures = report.failures.len(),
        "BOM load finished"
    );
}
