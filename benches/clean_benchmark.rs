//! Benchmarks for epub-tidy cleaning performance.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::io::Cursor;

/// Creates a synthetic chapter page with the given number of paragraphs,
/// surrounded by the usual site chrome.
fn create_chapter_page(paragraph_count: usize) -> String {
    let mut page = String::from(
        r#"<!DOCTYPE html><html><head><title>Truyện | Chương 1</title>
<style>body { margin: 0 }</style><script>track()</script></head>
<body>
<div class="bg-black"><a href="/">Trang chủ</a><button id="theme-toggle">Dark</button></div>
<div class="float-left">Prev</div><div class="float-right">Next</div>
<h1 class="text-lg font-bold text-center">Chương 1: Khởi đầu</h1>
<div id="content">
"#,
    );

    for i in 0..paragraph_count {
        page.push_str(&format!(
            "<p>Paragraph {} of the chapter, với một ít tiếng Việt để thử.</p>\n",
            i
        ));
        if i % 25 == 0 {
            page.push_str("<!-- ad slot --><p></p><div style=\"display:none\">hidden</div>\n");
        }
    }

    page.push_str(
        r#"<a class="font-bold text-green-001" href="/truyen/khac">Đọc truyện khác</a>
</div>
<div id="binh-luan"><form id="comment-form"><textarea></textarea></form></div>
<div class="bg-siver-001">Footer</div>
</body></html>"#,
    );
    page
}

/// Creates a synthetic EPUB holding `chapter_count` chapters.
fn create_test_epub(chapter_count: usize) -> Vec<u8> {
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    let mut buffer = Vec::new();
    let mut zip = ZipWriter::new(Cursor::new(&mut buffer));

    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Stored);

    zip.start_file("mimetype", options).unwrap();
    zip.write_all(b"application/epub+zip").unwrap();

    zip.start_file("META-INF/container.xml", options).unwrap();
    zip.write_all(br#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#).unwrap();

    let mut manifest = String::new();
    let mut spine = String::new();
    for i in 0..chapter_count {
        manifest.push_str(&format!(
            "    <item id=\"c{i}\" href=\"chapter{i:04}.xhtml\" media-type=\"application/xhtml+xml\"/>\n"
        ));
        spine.push_str(&format!("    <itemref idref=\"c{i}\"/>\n"));
    }

    zip.start_file("OEBPS/content.opf", options).unwrap();
    zip.write_all(format!(r#"<?xml version="1.0" encoding="utf-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="2.0" unique-identifier="uid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:title>Benchmark Novel</dc:title>
  </metadata>
  <manifest>
{manifest}  </manifest>
  <spine>
{spine}  </spine>
</package>"#).as_bytes()).unwrap();

    let page = create_chapter_page(40);
    for i in 0..chapter_count {
        zip.start_file(format!("OEBPS/chapter{i:04}.xhtml"), options).unwrap();
        zip.write_all(page.as_bytes()).unwrap();
    }

    zip.finish().unwrap();
    drop(zip);
    buffer
}

/// Benchmark single-page cleaning at various sizes.
fn bench_page_cleaning(c: &mut Criterion) {
    let mut group = c.benchmark_group("page_cleaning");

    for para_count in [10, 100, 500, 1000].iter() {
        let page = create_chapter_page(*para_count);

        group.throughput(Throughput::Bytes(page.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("paragraphs", para_count),
            &page,
            |b, page| {
                b.iter(|| epub_tidy::clean(black_box(page)));
            },
        );
    }

    group.finish();
}

/// Benchmark whole-archive processing, including repackaging.
fn bench_archive_processing(c: &mut Criterion) {
    let mut group = c.benchmark_group("archive_processing");
    group.sample_size(20);

    for chapter_count in [10, 50, 200].iter() {
        let data = create_test_epub(*chapter_count);

        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("chapters", chapter_count),
            &data,
            |b, data| {
                b.iter(|| {
                    let _ = epub_tidy::clean_epub_bytes(black_box(data.clone()));
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_page_cleaning, bench_archive_processing);
criterion_main!(benches);
