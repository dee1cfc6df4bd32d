use crate::job::JobDescriptor;
use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

pub const DEFAULT_PYTHON_BIN: &str = "python";
pub const PHD_SNP_SCRIPT: &str = "PhD-SNP.py";

/// How to start the predictor: a program plus the arguments that precede the
/// per-job mode flag and positional arguments. Built once at startup; the
/// scheduler never consults the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictorCommand {
    program: OsString,
    leading_args: Vec<OsString>,
}

impl PredictorCommand {
    pub fn new<P, I, A>(program: P, leading_args: I) -> Self
    where
        P: Into<OsString>,
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        Self {
            program: program.into(),
            leading_args: leading_args.into_iter().map(Into::into).collect(),
        }
    }

    /// `<python> -O <install_dir>/PhD-SNP.py`
    pub fn from_install_dir(python: impl Into<OsString>, install_dir: &Path) -> Self {
        let script: PathBuf = install_dir.join(PHD_SNP_SCRIPT);
        Self::new(python, [OsString::from("-O"), script.into_os_string()])
    }

    pub fn program(&self) -> &OsString {
        &self.program
    }

    /// Full argument vector for one job, program excluded.
    pub fn args_for(&self, job: &JobDescriptor) -> Vec<OsString> {
        self.leading_args
            .iter()
            .cloned()
            .chain(job.tool_args().into_iter().map(OsString::from))
            .collect()
    }

    /// Both output streams are captured, stdin is closed.
    pub fn build(&self, job: &JobDescriptor) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.args_for(job))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }

    pub fn display_for(&self, job: &JobDescriptor) -> String {
        std::iter::once(&self.program)
            .chain(self.args_for(job).iter())
            .map(|arg| arg.to_string_lossy().to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_dir_command_runs_script_with_job_arguments() {
        let seq = tempfile::NamedTempFile::new().expect("seq file");
        let seq_path = seq.path().to_string_lossy().to_string();
        let job = JobDescriptor::new("-seqb", &seq_path, "45", "A").expect("job");

        let command = PredictorCommand::from_install_dir("python3", Path::new("/opt/phd-snp"));
        let args = command.args_for(&job);
        let script = Path::new("/opt/phd-snp").join("PhD-SNP.py");
        assert_eq!(command.program(), "python3");
        assert_eq!(
            args,
            vec![
                OsString::from("-O"),
                script.into_os_string(),
                OsString::from("-seqb"),
                OsString::from(seq_path.as_str()),
                OsString::from("45"),
                OsString::from("A"),
            ]
        );
    }

    #[test]
    fn arguments_are_not_shell_split() {
        let dir = tempfile::tempdir().expect("tempdir");
        let seq = dir.path().join("my seq; rm -rf.fasta");
        std::fs::write(&seq, ">x\nM\n").expect("write");
        let seq_path = seq.to_string_lossy().to_string();
        let job = JobDescriptor::new("-seq", &seq_path, "1", "A").expect("job");

        let command = PredictorCommand::new("predict", Vec::<OsString>::new());
        let args = command.args_for(&job);
        assert_eq!(args.len(), 4);
        assert_eq!(args[1], OsString::from(seq_path));
    }
}
