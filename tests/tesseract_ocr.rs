//! Runs the real `tesseract` executable. Needs tesseract with English data:
//! `cargo test --test tesseract_ocr -- --ignored`.

use std::io::Cursor;
use std::sync::Arc;

use assistant_core::vision::{Extraction, TesseractCli, TextExtractor};
use image::{DynamicImage, GrayImage, ImageFormat, Luma};

const CELL: u32 = 8;
const MARGIN: u32 = 4;

/// 5x7 block glyphs for the characters the fixture uses.
fn glyph(c: char) -> [&'static str; 7] {
    match c {
        'I' => ["#####", "..#..", "..#..", "..#..", "..#..", "..#..", "#####"],
        'N' => ["#...#", "##..#", "##..#", "#.#.#", "#..##", "#..##", "#...#"],
        'V' => ["#...#", "#...#", "#...#", "#...#", "#...#", ".#.#.", "..#.."],
        'O' => [".###.", "#...#", "#...#", "#...#", "#...#", "#...#", ".###."],
        'C' => [".###.", "#...#", "#....", "#....", "#....", "#...#", ".###."],
        'E' => ["#####", "#....", "#....", "####.", "#....", "#....", "#####"],
        '#' => [".#.#.", ".#.#.", "#####", ".#.#.", "#####", ".#.#.", ".#.#."],
        '4' => ["...#.", "..##.", ".#.#.", "#..#.", "#####", "...#.", "...#."],
        '2' => [".###.", "#...#", "....#", "...#.", "..#..", ".#...", "#####"],
        _ => ["....."; 7],
    }
}

/// Black text on white, PNG encoded.
fn render(text: &str) -> Vec<u8> {
    let columns = text.chars().count() as u32 * 6 - 1 + 2 * MARGIN;
    let rows = 7 + 2 * MARGIN;
    let mut raster = GrayImage::from_pixel(columns * CELL, rows * CELL, Luma([255]));

    for (i, c) in text.chars().enumerate() {
        let left = MARGIN + i as u32 * 6;
        for (row, line) in glyph(c).iter().enumerate() {
            for (col, bit) in line.chars().enumerate() {
                if bit != '#' {
                    continue;
                }
                let x0 = (left + col as u32) * CELL;
                let y0 = (MARGIN + row as u32) * CELL;
                for y in y0..y0 + CELL {
                    for x in x0..x0 + CELL {
                        raster.put_pixel(x, y, Luma([0]));
                    }
                }
            }
        }
    }

    let mut bytes = Vec::new();
    DynamicImage::ImageLuma8(raster)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("png should encode");
    bytes
}

fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.chars().enumerate() {
        let mut row = vec![i + 1];
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != *cb);
            row.push(substitution.min(prev[j + 1] + 1).min(row[j] + 1));
        }
        prev = row;
    }
    prev[b.len()]
}

#[test]
#[ignore = "requires the tesseract executable"]
fn tesseract_reads_rendered_invoice_number() {
    let extractor = TextExtractor::new(Arc::new(TesseractCli::new("tesseract", "eng")));

    let extraction = extractor
        .extract_image(&render("INVOICE #42"))
        .expect("tesseract should run");
    let Extraction::Text(text) = extraction else {
        panic!("no text recognized");
    };

    let compact: String = text
        .to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    assert!(
        edit_distance(&compact, "INVOICE42") <= 2,
        "recognized {text:?}"
    );
}

#[test]
fn edit_distance_counts_single_edits() {
    assert_eq!(edit_distance("INVOICE42", "INVOICE42"), 0);
    assert_eq!(edit_distance("1NVOICE42", "INVOICE42"), 1);
    assert_eq!(edit_distance("INVOICE4", "INVOICE42"), 1);
}
