// crates/mq_cli/src/main.rs
//
// mqscore — offline, deterministic CLI driver for the measure scoring
// engine. Loads the two registries once, streams canonical submissions one
// line at a time, invokes the Pipeline per submission, and writes emitted
// events and diagnostics as line-delimited JSON.

mod args;

use std::fs;
use std::io::{BufRead, BufReader};
use std::process::ExitCode;

use args::{parse_and_validate, Args};
use mq_core::CanonicalFormSubmission;
use mq_registry::canonical_json::write_bytes_atomically;
use mq_registry::{FormBindingRegistry, MeasureRegistry};
use mq_pipeline::Pipeline;

fn main() -> ExitCode {
    let args = match parse_and_validate() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("mqscore: error: {e}");
            return ExitCode::from(1);
        }
    };

    match run(&args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("mqscore: error: {e}");
            ExitCode::from(1)
        }
    }
}

fn run(args: &Args) -> Result<ExitCode, String> {
    let measures = MeasureRegistry::load_all(&args.measure_registry)
        .map_err(|e| format!("loading measure registry: {e}"))?;
    let bindings = FormBindingRegistry::load_all(&args.form_binding_registry)
        .map_err(|e| format!("loading form binding registry: {e}"))?;
    let pipeline = Pipeline::new(&measures, &bindings);

    let input_file = fs::File::open(&args.input)
        .map_err(|e| format!("cannot open --in {}: {e}", args.input.display()))?;
    let reader = BufReader::new(input_file);

    let mut events_out = Vec::new();
    let mut diagnostics_out = Vec::new();

    let mut records_processed: u64 = 0;
    let mut events_emitted: u64 = 0;
    let mut records_with_diagnostics: u64 = 0;

    for (line_no, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| format!("reading {} line {}: {e}", args.input.display(), line_no + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        records_processed += 1;

        let submission: CanonicalFormSubmission = match serde_json::from_str(&line) {
            Ok(s) => s,
            Err(e) => {
                eprintln!(
                    "mqscore: error: {} line {}: malformed submission: {e}",
                    args.input.display(),
                    line_no + 1
                );
                records_with_diagnostics += 1;
                continue;
            }
        };

        match pipeline.process_submission(
            &submission,
            &args.binding,
            args.form_mappings.as_deref(),
            args.strict,
            args.deterministic_ids,
        ) {
            Ok(results) => {
                let mut record_failed = false;
                for result in &results {
                    if !result.success {
                        record_failed = true;
                    }
                    for event in &result.events {
                        append_json_line(&mut events_out, event)?;
                        events_emitted += 1;
                    }
                    append_json_line(&mut diagnostics_out, &result.diagnostics)?;
                }
                if record_failed {
                    records_with_diagnostics += 1;
                }
            }
            Err(e) => {
                eprintln!(
                    "mqscore: error: submission '{}': {e}",
                    submission.submission_id
                );
                records_with_diagnostics += 1;
            }
        }
    }

    write_bytes_atomically(&args.out, &events_out)
        .map_err(|e| format!("writing --out {}: {e}", args.out.display()))?;

    if let Some(diag_path) = &args.diagnostics {
        write_bytes_atomically(diag_path, &diagnostics_out)
            .map_err(|e| format!("writing --diagnostics {}: {e}", diag_path.display()))?;
    }

    if !args.quiet {
        println!(
            "mqscore: records_processed={records_processed} events_emitted={events_emitted} records_with_diagnostics={records_with_diagnostics}"
        );
    }

    Ok(if records_with_diagnostics > 0 {
        ExitCode::from(2)
    } else {
        ExitCode::from(0)
    })
}

fn append_json_line<T: serde::Serialize>(buf: &mut Vec<u8>, value: &T) -> Result<(), String> {
    serde_json::to_writer(&mut *buf, value).map_err(|e| format!("serializing output record: {e}"))?;
    buf.push(b'\n');
    Ok(())
}
