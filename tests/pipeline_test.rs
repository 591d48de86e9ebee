//! End-to-end pipeline tests against a mocked annotation service.
//!
//! Covers happy-path demultiplexing, multiple consequence types sharing one
//! request, and an all-rejecting filter chain that skips dispatch entirely.

use std::io::Write;
use std::path::PathBuf;

use variant_effect_annotator::config::Config;
use variant_effect_annotator::filter::{FilterChain, RegionFilter};
use variant_effect_annotator::pipeline::Pipeline;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SERVICE_PATH: &str = "/cellbase/rest/v4/hsapiens/genomic/variant/consequence_type";

fn write_vcf(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("create temp vcf");
    file.write_all(contents.as_bytes()).expect("write temp vcf");
    file
}

fn base_config(output_directory: PathBuf, host_url: String) -> Config {
    Config {
        host_url,
        version: "v4".to_string(),
        species: "hsapiens".to_string(),
        num_threads: 2,
        batch_size: 2,
        max_batches: 4,
        variants_per_request: 2,
        output_directory,
        output_filename: Some("annotated.vcf".to_string()),
    }
}

fn single_chunk_config(output_directory: PathBuf, host_url: String) -> Config {
    let mut config = base_config(output_directory, host_url);
    config.batch_size = 10;
    config.variants_per_request = 10;
    config
}

#[test]
fn happy_path_demultiplexes_by_consequence_type() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let server = rt.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SERVICE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "1\t100\tA\tG\tSO:0001583\tmissense_variant\n\
                 1\t200\tC\tT\tSO:0001583\tmissense_variant\n",
            ))
            .mount(&server)
            .await;
        server
    });

    let vcf = write_vcf(
        "##fileformat=VCFv4.2\n\
         #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n\
         1\t100\t.\tA\tG\t.\tPASS\t.\n\
         1\t200\t.\tC\tT\t.\tPASS\t.\n",
    );
    let out_dir = tempfile::tempdir().unwrap();
    let config = base_config(out_dir.path().to_path_buf(), server.uri());

    let pipeline = Pipeline::builder(config, vcf.path().to_path_buf())
        .build()
        .unwrap();
    let summary = pipeline.run().unwrap();

    assert_eq!(summary.counts["missense_variant"], 2);

    let all_variants = std::fs::read_to_string(out_dir.path().join("all_variants.txt")).unwrap();
    assert_eq!(all_variants.lines().count(), 2);

    let per_type =
        std::fs::read_to_string(out_dir.path().join("missense_variant.txt")).unwrap();
    assert_eq!(per_type.lines().count(), 2);

    let summary_contents = std::fs::read_to_string(out_dir.path().join("summary.txt")).unwrap();
    assert_eq!(summary_contents, "missense_variant\t2\n");

    drop(server);
    drop(rt);
}

#[test]
fn distinct_consequence_types_land_in_separate_files_and_counters() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let server = rt.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SERVICE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "1\t100\tSO:0001583\tmissense_variant\n\
                 1\t200\tSO:0001583\tmissense_variant\n\
                 1\t300\tSO:0001819\tsynonymous_variant\n",
            ))
            .mount(&server)
            .await;
        server
    });

    let vcf = write_vcf(
        "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n\
         1\t100\t.\tA\tG\t.\tPASS\t.\n\
         1\t200\t.\tA\tG\t.\tPASS\t.\n\
         1\t300\t.\tA\tG\t.\tPASS\t.\n",
    );
    let out_dir = tempfile::tempdir().unwrap();
    // batch_size and variants_per_request both cover the whole input, so
    // all three records land in a single chunk/request.
    let config = single_chunk_config(out_dir.path().to_path_buf(), server.uri());

    let pipeline = Pipeline::builder(config, vcf.path().to_path_buf())
        .build()
        .unwrap();
    let summary = pipeline.run().unwrap();

    assert_eq!(summary.counts["missense_variant"], 2);
    assert_eq!(summary.counts["synonymous_variant"], 1);

    let all_variants = std::fs::read_to_string(out_dir.path().join("all_variants.txt")).unwrap();
    assert_eq!(all_variants.lines().count(), 3);

    drop(server);
    drop(rt);
}

#[test]
fn filter_rejecting_everything_skips_dispatch_and_fills_the_filtered_file() {
    // No mock is registered: if the pipeline tried to dispatch any chunk,
    // wiremock would panic on the unexpected request once the server is
    // dropped with unmet/unused expectations disabled by default, or the
    // connection would simply fail. We assert directly that no HTTP work
    // happened by checking there are zero observed consequence types.
    let rt = tokio::runtime::Runtime::new().unwrap();
    let server = rt.block_on(async { MockServer::start().await });

    let vcf = write_vcf(
        "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n\
         1\t100\t.\tA\tG\t.\tPASS\t.\n\
         1\t200\t.\tA\tG\t.\tPASS\t.\n\
         1\t300\t.\tA\tG\t.\tPASS\t.\n",
    );
    let out_dir = tempfile::tempdir().unwrap();
    let config = base_config(out_dir.path().to_path_buf(), server.uri());

    let filter_chain = FilterChain::builder()
        .stage(Box::new(RegionFilter {
            chromosomes: vec!["nonexistent".to_string()],
        }))
        .build();

    let pipeline = Pipeline::builder(config, vcf.path().to_path_buf())
        .filter_chain(filter_chain)
        .build()
        .unwrap();
    let summary = pipeline.run().unwrap();

    assert!(summary.counts.is_empty());

    let passed = std::fs::read_to_string(out_dir.path().join("annotated.vcf")).unwrap();
    assert_eq!(passed.lines().count(), 1, "only the header line");

    let failed =
        std::fs::read_to_string(out_dir.path().join("annotated.vcf.filtered")).unwrap();
    assert_eq!(failed.lines().count(), 4, "header plus all 3 rejected records");

    let summary_contents = std::fs::read_to_string(out_dir.path().join("summary.txt")).unwrap();
    assert_eq!(summary_contents, "");

    drop(server);
    drop(rt);
}
