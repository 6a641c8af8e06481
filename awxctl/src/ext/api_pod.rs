use std::time::Duration;

use k8s_openapi::{api::core::v1::Pod, apimachinery::pkg::apis::meta::v1::Status};
use kube::{
    Api,
    api::AttachParams,
    runtime::{conditions::is_pod_running, wait::await_condition},
};
use snafu::{OptionExt, ResultExt};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::ext::{Error, error};

/// A command to run inside a container.
///
/// `program` is what shows up in logs and error messages; `argv` may carry
/// credentials and is never logged.
#[derive(Clone)]
pub struct RemoteCommand {
    pub container: String,
    pub program: String,
    pub argv: Vec<String>,
}

/// Pod operations on top of `Api<Pod>`.
pub trait ApiPodExt {
    /// Waits until the pod is running, at most for `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `Error::WaitForPodStatus` when the timeout elapses first.
    async fn await_running_status(
        &self,
        pod_name: &str,
        namespace: &str,
        timeout: Duration,
    ) -> Result<Pod, Error>;

    /// Runs `command` in the pod and relays its standard streams.
    ///
    /// `stdin`, when given, is copied to the remote process and closed
    /// afterwards. Remote stdout and stderr are copied concurrently into
    /// `stdout` and `stderr`. The call succeeds only when Kubernetes reports
    /// the process as successful.
    ///
    /// # Errors
    ///
    /// * `Error::ExecInPod` when the exec session cannot be opened.
    /// * `Error::CopyIo` when relaying one of the streams fails.
    /// * `Error::CommandFailed` with the remote message when the process
    ///   exits unsuccessfully.
    /// * `Error::GetExecStatus` when the session ends without a status.
    async fn exec_streaming<I, O, E>(
        &self,
        pod_name: &str,
        command: RemoteCommand,
        stdin: Option<I>,
        stdout: &mut O,
        stderr: &mut E,
    ) -> Result<(), Error>
    where
        I: AsyncRead + Unpin,
        O: AsyncWrite + Unpin,
        E: AsyncWrite + Unpin;
}

impl ApiPodExt for Api<Pod> {
    async fn await_running_status(
        &self,
        pod_name: &str,
        namespace: &str,
        timeout: Duration,
    ) -> Result<Pod, Error> {
        let maybe_pod = tokio::time::timeout(
            timeout,
            await_condition(self.clone(), pod_name, is_pod_running()),
        )
        .await
        .map_err(|_| Error::WaitForPodStatus {
            namespace: namespace.to_string(),
            pod_name: pod_name.to_string(),
        })?
        .with_context(|_| error::GetPodStatusSnafu {
            namespace: namespace.to_string(),
            pod_name: pod_name.to_string(),
        })?;
        match maybe_pod {
            Some(pod) => Ok(pod),
            None => self.get(pod_name).await.with_context(|_| error::GetPodSnafu {
                namespace: namespace.to_string(),
                pod_name: pod_name.to_string(),
            }),
        }
    }

    async fn exec_streaming<I, O, E>(
        &self,
        pod_name: &str,
        command: RemoteCommand,
        stdin: Option<I>,
        stdout: &mut O,
        stderr: &mut E,
    ) -> Result<(), Error>
    where
        I: AsyncRead + Unpin,
        O: AsyncWrite + Unpin,
        E: AsyncWrite + Unpin,
    {
        let RemoteCommand { container, program, argv } = command;
        let params = AttachParams::default()
            .container(container)
            .stdin(stdin.is_some())
            .stdout(true)
            .stderr(true);

        tracing::debug!("Executing `{program}` in pod {pod_name}");
        let mut attached = self.exec(pod_name, argv, &params).await.with_context(|_| {
            error::ExecInPodSnafu { pod_name: pod_name.to_string(), program: program.clone() }
        })?;

        let status = attached.take_status().with_context(|| error::GetExecStatusSnafu {
            pod_name: pod_name.to_string(),
            program: program.clone(),
        })?;
        let mut pod_stdout =
            attached.stdout().context(error::GetPodStreamSnafu { stream: "stdout" })?;
        let mut pod_stderr =
            attached.stderr().context(error::GetPodStreamSnafu { stream: "stderr" })?;
        let pod_stdin = match stdin {
            Some(input) => {
                Some((input, attached.stdin().context(error::GetPodStreamSnafu { stream: "stdin" })?))
            }
            None => None,
        };

        let feed_stdin = async {
            if let Some((mut input, mut writer)) = pod_stdin {
                match tokio::io::copy(&mut input, &mut writer).await {
                    Ok(_) => {}
                    // the remote process stopped reading, its status tells why
                    Err(err) if err.kind() == std::io::ErrorKind::BrokenPipe => {}
                    Err(source) => {
                        return Err(Error::CopyIo {
                            program: program.clone(),
                            stream: "stdin".into(),
                            source,
                        });
                    }
                }
                let _unused = writer.shutdown().await;
            }
            Ok::<(), Error>(())
        };
        let relay_stdout = async {
            tokio::io::copy(&mut pod_stdout, &mut *stdout).await.map_err(|source| Error::CopyIo {
                program: program.clone(),
                stream: "stdout".into(),
                source,
            })
        };
        let relay_stderr = async {
            tokio::io::copy(&mut pod_stderr, &mut *stderr).await.map_err(|source| Error::CopyIo {
                program: program.clone(),
                stream: "stderr".into(),
                source,
            })
        };
        let _unused = tokio::try_join!(feed_stdin, relay_stdout, relay_stderr)?;

        stdout.flush().await.context(error::CopyIoSnafu {
            program: program.clone(),
            stream: "stdout",
        })?;
        stderr.flush().await.context(error::CopyIoSnafu {
            program: program.clone(),
            stream: "stderr",
        })?;

        let status = status.await;
        let _unused = attached.join().await;

        check_exec_status(status, pod_name, program)
    }
}

/// Maps the `Status` Kubernetes reports for an exec session to a result.
///
/// # Errors
///
/// * `Error::CommandFailed` carrying the remote message when the status is
///   anything but `Success`.
/// * `Error::GetExecStatus` when the session ended without a status.
fn check_exec_status(status: Option<Status>, pod_name: &str, program: String) -> Result<(), Error> {
    match status {
        Some(status) if status.status.as_deref() == Some("Success") => Ok(()),
        Some(status) => error::CommandFailedSnafu {
            pod_name: pod_name.to_string(),
            program,
            message: status.message.unwrap_or_else(|| "unknown failure".to_string()),
        }
        .fail(),
        None => error::GetExecStatusSnafu { pod_name: pod_name.to_string(), program }.fail(),
    }
}
