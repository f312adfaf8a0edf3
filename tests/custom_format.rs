use dumpframes::{CustomOptions, FrameLoader, LoaderError, ParseMethod, Vec3};
use std::error::Error;
use std::io::Write;
use tempfile::NamedTempFile;

fn temp_table(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write to temp file");
    file.flush().expect("Failed to flush temp file");
    file
}

#[test]
fn wrong_token_count_drops_only_that_line() -> Result<(), Box<dyn Error>> {
    let file = temp_table(
        "\
0 0 0 1
1 0 0 1
2 0 0
3 0 0 1
4 0 0 1
",
    );

    let mut loader = FrameLoader::new();
    let data = loader.parse_custom(file.path(), &CustomOptions::new())?;

    assert_eq!(data.len(), 4);
    let xs: Vec<f32> = data.positions.iter().map(|p| p.x).collect();
    assert_eq!(xs, vec![0.0, 1.0, 3.0, 4.0]);
    assert_eq!(data.column("col_3").map(<[f32]>::len), Some(4));

    let report = loader.last_report().cloned().expect("report");
    assert_eq!(report.method, ParseMethod::Columnar);
    assert_eq!(report.skipped_lines, 1);
    Ok(())
}

#[test]
fn start_line_and_extra_columns() -> Result<(), Box<dyn Error>> {
    let file = temp_table(
        "\
# exported particle table
x y z temperature pressure
1.0 2.0 3.0 300.0 1.5
4.0 5.0 6.0 310.0 2.5
",
    );

    let data = FrameLoader::new().parse_custom(file.path(), &CustomOptions::new().with_start_line(2))?;

    assert_eq!(data.positions, vec![Vec3::new(1.0, 2.0, 3.0), Vec3::new(4.0, 5.0, 6.0)]);
    assert_eq!(data.column_names().collect::<Vec<_>>(), vec!["col_3", "col_4"]);
    assert_eq!(data.column("col_3"), Some(&[300.0, 310.0][..]));
    assert_eq!(data.column("col_4"), Some(&[1.5, 2.5][..]));
    Ok(())
}

#[test]
fn invalid_numbers_are_skipped() -> Result<(), Box<dyn Error>> {
    let file = temp_table("1 2 3\nx y z\n4 5 6\n");

    let mut loader = FrameLoader::new();
    let data = loader.parse_custom(file.path(), &CustomOptions::new())?;
    assert_eq!(data.len(), 2);
    assert_eq!(loader.last_report().map(|r| r.skipped_lines), Some(1));
    Ok(())
}

#[test]
fn max_particles_truncates_output() -> Result<(), Box<dyn Error>> {
    let rows: String = (0..50).map(|i| format!("{i} 0 0 {i}\n")).collect();
    let file = temp_table(&rows);

    let data = FrameLoader::new()
        .parse_custom(file.path(), &CustomOptions::new().with_max_particles(10))?;
    assert_eq!(data.len(), 10);
    assert_eq!(data.column("col_3").map(<[f32]>::len), Some(10));
    assert_eq!(data.positions[9].x, 9.0);
    Ok(())
}

#[test]
fn fewer_than_three_columns_is_a_format_error() {
    let file = temp_table("1 2\n3 4\n");
    let result = FrameLoader::new().parse_custom(file.path(), &CustomOptions::new());
    assert!(matches!(result, Err(LoaderError::Format(_))));
}

#[test]
fn empty_after_skip_is_a_format_error() {
    let file = temp_table("header\n");
    let result =
        FrameLoader::new().parse_custom(file.path(), &CustomOptions::new().with_start_line(1));
    assert!(matches!(result, Err(LoaderError::Format(_))));
}

#[test]
fn missing_custom_file_is_not_found() {
    let result = FrameLoader::new().parse_custom("no/such/table.txt", &CustomOptions::new());
    assert!(matches!(result, Err(LoaderError::NotFound(_))));
}

#[cfg(feature = "streaming")]
mod streaming {
    use super::*;

    fn streaming_loader() -> FrameLoader {
        FrameLoader::builder()
            .large_file_threshold(16)
            .chunk_size(32)
            .build()
            .expect("valid config")
    }

    #[test]
    fn large_files_are_streamed_in_windows() -> Result<(), Box<dyn Error>> {
        let mut content = String::from("header line\n");
        for i in 0..200 {
            content.push_str(&format!("{i}.0 1.0 2.0 {i}\n"));
        }
        let file = temp_table(&content);

        let mut loader = streaming_loader();
        let data = loader.parse_custom(file.path(), &CustomOptions::new().with_start_line(1))?;

        assert_eq!(loader.last_report().map(|r| r.method), Some(ParseMethod::Streaming));
        assert_eq!(data.len(), 200);
        assert_eq!(data.positions[0], Vec3::new(0.0, 1.0, 2.0));
        assert_eq!(data.positions[199].x, 199.0);
        assert_eq!(data.column("col_3").map(|c| c[150]), Some(150.0));
        Ok(())
    }

    #[test]
    fn streaming_skips_bad_lines_and_pads_extras() -> Result<(), Box<dyn Error>> {
        let file = temp_table("1 2 3 4\n5 6\nbad 0 0 0\n7 8 9\n\n10 11 12 13\n");

        let mut loader = streaming_loader();
        let data = loader.parse_custom(file.path(), &CustomOptions::new())?;

        assert_eq!(data.len(), 3);
        assert_eq!(data.column("col_3"), Some(&[4.0, 0.0, 13.0][..]));
        assert_eq!(loader.last_report().map(|r| r.skipped_lines), Some(2));
        Ok(())
    }

    #[test]
    fn particle_cap_disables_streaming() -> Result<(), Box<dyn Error>> {
        let file = temp_table("1 2 3\n4 5 6\n7 8 9\n");

        let mut loader = streaming_loader();
        let data = loader.parse_custom(file.path(), &CustomOptions::new().with_max_particles(2))?;

        assert_eq!(loader.last_report().map(|r| r.method), Some(ParseMethod::Columnar));
        assert_eq!(data.len(), 2);
        Ok(())
    }
}
