// Licensed under the Apache-2.0 license

#[cfg(test)]
mod test {
    use clap::Parser;
    use emulator::{Emulator, EmulatorArgs};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::io::Write;
    use std::sync::atomic::AtomicBool;

    fn run(args: &[String]) -> anyhow::Result<emulator::EmulatorReport> {
        let cli = EmulatorArgs::try_parse_from(
            std::iter::once("emulator".to_string()).chain(args.iter().cloned()),
        )?;
        Emulator::from_args(&cli)?.run(&AtomicBool::new(true))
    }

    #[test]
    fn test_image_is_served_big_endian() {
        let mut rng = StdRng::seed_from_u64(0x1_3a6e);
        let words: Vec<u32> = (0..16).map(|_| rng.gen()).collect();
        let mut image = tempfile::NamedTempFile::new().unwrap();
        for word in words.iter() {
            image.write_all(&word.to_be_bytes()).unwrap();
        }
        image.flush().unwrap();

        let mut args = vec![
            "--no-seed".to_string(),
            "--flash-image".to_string(),
            image.path().display().to_string(),
            "--flash-image-offset".to_string(),
            "0x1000".to_string(),
        ];
        for index in 0..words.len() {
            args.push("--read".to_string());
            args.push(format!("0x{:x}", 0x1000 + index * 4));
        }

        let report = run(&args).unwrap();
        let served: Vec<u32> = report.reads.iter().map(|r| r.word).collect();
        assert_eq!(served, words);
        assert_eq!(report.mismatches(), 0);
        assert_eq!(report.transactions, words.len() as u64);
    }

    #[test]
    fn test_image_overrides_seed_and_words_override_image() {
        let mut image = tempfile::NamedTempFile::new().unwrap();
        image.write_all(&[0xCA, 0xFE, 0xF0, 0x0D, 0x01]).unwrap();
        image.flush().unwrap();

        let args: Vec<String> = [
            "--flash-image",
            &image.path().display().to_string(),
            "--word",
            "0x4=0x55aa55aa",
            "--read",
            "0x0",
            "--read",
            "0x4",
            "--read",
            "0x8",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let report = run(&args).unwrap();
        let served: Vec<u32> = report.reads.iter().map(|r| r.word).collect();
        assert_eq!(served, vec![0xCAFE_F00D, 0x55AA_55AA, 0x1122_3344]);
    }

    #[test]
    fn test_missing_image_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.bin");
        let args = vec!["--flash-image".to_string(), missing.display().to_string()];
        assert!(run(&args).is_err());
    }

    #[test]
    fn test_json_report() {
        let report = run(&[]).unwrap();
        let json: serde_json::Value = serde_json::to_value(&report).unwrap();
        assert_eq!(json["transactions"], 3);
        assert_eq!(json["completed_reads"], 3);
        assert_eq!(json["reads"][1]["address"], 4);
        assert_eq!(json["reads"][1]["word"], 0xABCD_EF00_u32);
    }
}
