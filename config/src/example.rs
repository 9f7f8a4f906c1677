/// Example configuration printed by `--example`.
pub const EXAMPLE_CONFIG: &str = r#"# valdag example configuration
name: example_validation
LFS: /eos/cms/store/group/alca_trackeralign/example

alignments:
  ideal:
    title: Ideal geometry
    globaltag: auto:phase1_2018_design
  prompt:
    title: Prompt alignment
    globaltag: 106X_dataRun2_v28
    conditions:
      TrackerAlignmentRcd:
        connect: frontier://FrontierProd/CMS_CONDITIONS
        tag: TrackerAlignment_PCL_byRun_v2_express

validations:
  GCP:
    prompt_vs_ideal:
      IOV: [315257]
      reference: ideal
      test: prompt

  DMR:
    single:
      cosmics:
        IOV: [315257, 320000]
        alignments: [ideal, prompt]
        dataset: /afs/cern.ch/user/e/example/cosmics_files.txt
        trackcollection: ALCARECOTkAlCosmicsCTF0T
        maxevents: 100000
    merge:
      cosmics_summary:
        singles: [cosmics]
        methods: [median, rmsNorm]

  PV:
    single:
      minbias:
        IOV: [315257]
        alignments: [ideal, prompt]
        dataset: /afs/cern.ch/user/e/example/minbias_files.txt
        goodlumi: /afs/cern.ch/user/e/example/lumi_{}.json
    merge:
      minbias_summary:
        singles: [minbias]

  JetHT:
    single:
      jetht2018:
        alignments: [ideal, prompt]
        dataset: /JetHT/Run2018A-TkAlMinBias-12Nov2019_UL2018-v2/ALCARECO
        filesPerJob: 10
    merge:
      jetht2018:
        singles: [jetht2018]
        alignments: [ideal, prompt]
    plot:
      jetht2018:
        merges: [jetht2018]
        alignments: [ideal, prompt]
        jethtplot:
          drawProfiles: true
"#;

#[cfg(test)]
mod test {
    use super::*;
    use crate::{parse_str, Format, Validation};
    use anyhow::Result;

    #[test]
    fn test_example_parses() -> Result<()> {
        let config = parse_str(EXAMPLE_CONFIG, Format::Yaml, &|_| None)?;
        let validations = config.parse_validations()?;
        assert_eq!(validations.len(), 4);
        assert!(matches!(validations[3], Validation::JetHt(_)));
        Ok(())
    }
}
