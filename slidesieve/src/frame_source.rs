extern crate ffmpeg_next as ffmpeg;

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use ffmpeg::codec::Context as CodecContext;
use ffmpeg::decoder::Video as DecoderVideo;
use ffmpeg::format::context::Input as FormatContext;
use ffmpeg::format::{input, Pixel};
use ffmpeg::frame::Video as FrameVideo;
use ffmpeg::media::Type;
use ffmpeg::software::scaling::context::Context as ScalingContext;
use ffmpeg::util::log as ffmpeglog;
use ffmpeg::Packet as CodecPacket;
use image::RgbImage;

static FFMPEG_INITIALIZED: OnceLock<Result<(), ffmpeg::Error>> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to initialize the video backend: {0}")]
    Init(#[source] ffmpeg::Error),
    #[error("failed to open the video at {path}: {source}")]
    Open {
        path: PathBuf,
        source: ffmpeg::Error,
    },
    #[error("no video stream in {path}")]
    NoVideoStream { path: PathBuf },
    #[error("failed to set up a decoder: {0}")]
    Codec(#[source] ffmpeg::Error),
    #[error("the decoder has no pixel format")]
    NoPixelFormat,
    #[error("failed to set up the RGB converter: {0}")]
    Converter(#[source] ffmpeg::Error),
    #[error("failed to read from the video stream: {0}")]
    Read(#[source] ffmpeg::Error),
    #[error("failed to decode a frame: {0}")]
    Decode(#[source] ffmpeg::Error),
    #[error("failed to convert a frame to RGB: {0}")]
    Convert(#[source] ffmpeg::Error),
}

/// Decodes a video into RGB frames, numbered from 0 in decode order. The
/// demuxer and decoder handles live as long as the source does.
pub struct FrameSource {
    ictx: FormatContext,
    decoder: DecoderVideo,
    converter: ScalingContext,
    video_stream_index: usize,
    next_index: u64,
    total_frames: Option<u64>,
}

impl FrameSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();

        if let Err(e) = FFMPEG_INITIALIZED.get_or_init(|| {
            ffmpeg::init()?;
            ffmpeglog::set_level(ffmpeglog::Level::Warning);
            Ok(())
        }) {
            return Err(SourceError::Init(*e));
        }

        let mut ictx = input(&path).map_err(|source| SourceError::Open {
            path: path.to_owned(),
            source,
        })?;

        let video = ictx
            .streams()
            .best(Type::Video)
            .ok_or_else(|| SourceError::NoVideoStream {
                path: path.to_owned(),
            })?;
        let video_stream_index = video.index();
        let total_frames = u64::try_from(video.frames()).ok().filter(|&n| n > 0);

        let decoder = CodecContext::from_parameters(video.parameters())
            .map_err(SourceError::Codec)?
            .decoder()
            .video()
            .map_err(SourceError::Codec)?;

        let converter = Self::pixel_converter(&decoder)?;

        ictx.streams_mut()
            .filter(|stream| stream.index() != video_stream_index)
            .for_each(|mut stream| stream_set_discard_all(&mut stream));

        Ok(Self {
            ictx,
            decoder,
            converter,
            video_stream_index,
            next_index: 0,
            total_frames,
        })
    }

    fn pixel_converter(decoder: &DecoderVideo) -> Result<ScalingContext, SourceError> {
        if decoder.format() == Pixel::None {
            return Err(SourceError::NoPixelFormat);
        }
        ScalingContext::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            Pixel::RGB24,
            decoder.width(),
            decoder.height(),
            ffmpeg::software::scaling::Flags::FAST_BILINEAR,
        )
        .map_err(SourceError::Converter)
    }

    /// The container's own frame count for the video stream, when it knows it.
    pub fn approx_frame_count(&self) -> Option<u64> {
        self.total_frames
    }

    /// The next frame in decode order, or None at end of stream.
    pub fn next_frame(&mut self) -> Result<Option<(u64, RgbImage)>, SourceError> {
        loop {
            loop {
                let mut frame = FrameVideo::empty();
                // avcodec_receive_frame
                match self.decoder.receive_frame(&mut frame) {
                    Ok(()) => (),
                    Err(ffmpeg::Error::Other {
                        errno: libc::EAGAIN,
                    }) => break,
                    Err(ffmpeg::Error::Eof) => return Ok(None),
                    Err(e) => return Err(SourceError::Decode(e)),
                }

                let mut converted = FrameVideo::empty();
                self.converter
                    .run(&frame, &mut converted)
                    .map_err(SourceError::Convert)?;
                let img = create_rust_image(converted);

                let index = self.next_index;
                self.next_index += 1;
                return Ok(Some((index, img)));
            }

            loop {
                let mut packet = CodecPacket::empty();
                match packet.read(&mut self.ictx) {
                    Ok(()) if packet.stream() == self.video_stream_index => {
                        match self.decoder.send_packet(&packet) {
                            Ok(()) => break,
                            Err(e) => {
                                log::warn!("Skipping a packet the decoder rejected: {e}");
                                continue;
                            }
                        }
                    }
                    Ok(()) => continue,
                    Err(ffmpeg::Error::Eof) => {
                        self.decoder.send_eof().map_err(SourceError::Decode)?;
                        break;
                    }
                    Err(e) => return Err(SourceError::Read(e)),
                }
            }
        }
    }

    pub fn iter(&mut self) -> FrameSourceIter<'_> {
        FrameSourceIter { source: self }
    }
}

pub struct FrameSourceIter<'a> {
    source: &'a mut FrameSource,
}

impl Iterator for FrameSourceIter<'_> {
    type Item = Result<(u64, RgbImage), SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.source.next_frame().transpose()
    }
}

fn create_rust_image(converted: FrameVideo) -> RgbImage {
    assert_eq!(Pixel::RGB24, converted.format());
    assert_eq!(1, converted.planes());

    let src_linesize = converted.stride(0);
    let width: usize = converted.width().try_into().expect("will always fit");
    let height: usize = converted.height().try_into().expect("will always fit");
    let data = converted.data(0);
    let trg_linesize = 3 * width;

    // https://stackoverflow.com/a/57666844
    let data = if src_linesize == trg_linesize {
        data.to_vec()
    } else {
        assert!(src_linesize >= trg_linesize);
        let mut nopadding = vec![0; trg_linesize * height];
        for row in 0..height {
            nopadding[row * trg_linesize..(row + 1) * trg_linesize].copy_from_slice(
                &data[row * src_linesize..row * src_linesize + trg_linesize],
            );
        }
        nopadding
    };

    RgbImage::from_raw(width as u32, height as u32, data)
        .expect("the buffer has the right size")
}

fn stream_set_discard_all(stream: &mut ffmpeg::StreamMut<'_>) {
    unsafe {
        let ptr = stream.as_mut_ptr();
        if !ptr.is_null() {
            (*ptr).discard = ffmpeg_sys_next::AVDiscard::AVDISCARD_ALL;
        }
    }
}
